//! WASM bindings for the linear dynamical systems core.
//!
//! Module layout:
//! - `system`: `WasmLinearSystem`, holding `A` and exposing its analyses
//! - `payload`: serializable results and the pure builders behind every binding

mod payload;
mod system;

pub use system::WasmLinearSystem;

use js_sys::Float64Array;
use linsys_core::grid::time_grid as core_time_grid;
use num_complex::Complex64;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// Forward-Euler run of `dx/dt = a x` for complex `a` and `x0`.
#[wasm_bindgen]
pub fn integrate_exponential(
    a_re: f64,
    a_im: f64,
    x0_re: f64,
    x0_im: f64,
    dt: f64,
    t_final: f64,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let payload = payload::exponential_payload(
        Complex64::new(a_re, a_im),
        Complex64::new(x0_re, x0_im),
        dt,
        t_final,
    )
    .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
    to_value(&payload).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Sample times `k * dt` covering `[0, T)`.
#[wasm_bindgen]
pub fn time_grid(dt: f64, t_final: f64) -> Result<Float64Array, JsValue> {
    let times = core_time_grid(dt, t_final)
        .map_err(|e| JsValue::from_str(&format!("Invalid time grid: {}", e)))?;
    Ok(Float64Array::from(times.as_slice()))
}

/// Every documented scenario as an array of figure payloads, in run order.
#[wasm_bindgen]
pub fn documented_scenarios() -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let figures = payload::scenario_figures()
        .map_err(|e| JsValue::from_str(&format!("Scenario failed: {:#}", e)))?;
    to_value(&figures).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
