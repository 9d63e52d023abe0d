//! `WasmLinearSystem`: a linear system `dx/dt = A x` held on the Rust side.

use crate::payload::{eigen_payload, trajectory_payload, vector_field_payload};
use linsys_core::eigen::classify_planar;
use linsys_core::linear::LinearSystem;
use nalgebra::DMatrix;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmLinearSystem {
    pub(crate) system: LinearSystem,
}

#[wasm_bindgen]
impl WasmLinearSystem {
    /// Builds `A` from `dim * dim` row-major entries.
    #[wasm_bindgen(constructor)]
    pub fn new(dim: usize, entries: Vec<f64>) -> Result<WasmLinearSystem, JsValue> {
        console_error_panic_hook::set_once();

        let system = LinearSystem::from_row_slice(dim, &entries)
            .map_err(|e| JsValue::from_str(&format!("Invalid system matrix: {}", e)))?;
        Ok(WasmLinearSystem { system })
    }

    pub fn dimension(&self) -> usize {
        self.system.matrix().nrows()
    }

    /// Row-major copy of `A`.
    pub fn matrix(&self) -> Vec<f64> {
        row_major(self.system.matrix())
    }

    pub fn trace(&self) -> f64 {
        self.system.trace()
    }

    pub fn determinant(&self) -> f64 {
        self.system.determinant()
    }

    pub fn derivative(&self, t: f64, state: Vec<f64>) -> Result<Vec<f64>, JsValue> {
        self.system
            .derivative(t, &state)
            .map_err(|e| JsValue::from_str(&format!("Derivative failed: {}", e)))
    }

    pub fn eigen_decompose(&self) -> Result<JsValue, JsValue> {
        let payload = eigen_payload(&self.system)
            .map_err(|e| JsValue::from_str(&format!("Eigen analysis failed: {:#}", e)))?;
        to_value(&payload).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Equilibrium type of a planar system, e.g. `"saddle"`.
    pub fn classify(&self) -> Result<JsValue, JsValue> {
        let kind = classify_planar(self.system.matrix())
            .map_err(|e| JsValue::from_str(&format!("Classification failed: {}", e)))?;
        to_value(&kind).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Solves from `x0` and samples on `[0, T)`. Pass `0` for `rtol`/`atol` to
    /// keep the solver defaults.
    pub fn solve_trajectory(
        &self,
        x0: Vec<f64>,
        dt: f64,
        t_final: f64,
        rtol: f64,
        atol: f64,
    ) -> Result<JsValue, JsValue> {
        let payload = trajectory_payload(&self.system, &x0, dt, t_final, rtol, atol)
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        to_value(&payload).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn sample_vector_field(&self, start: f64, stop: f64, step: f64) -> Result<JsValue, JsValue> {
        let grid = vector_field_payload(&self.system, start, stop, step)
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        to_value(&grid).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

pub(crate) fn row_major(matrix: &DMatrix<f64>) -> Vec<f64> {
    matrix.transpose().as_slice().to_vec()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn error_message(err: JsValue) -> String {
        err.as_string().unwrap_or_default()
    }

    #[wasm_bindgen_test]
    fn constructor_rejects_wrong_entry_count() {
        let result = WasmLinearSystem::new(2, vec![1.0, 2.0, 3.0]);
        let message = result.err().map(error_message).unwrap_or_default();
        assert!(message.contains("Invalid system matrix"));
    }

    #[wasm_bindgen_test]
    fn derivative_rejects_wrong_state_length() {
        let wasm = WasmLinearSystem::new(2, vec![1.0, 0.0, 0.0, 1.0]).expect("system");
        let message = wasm
            .derivative(0.0, vec![1.0])
            .err()
            .map(error_message)
            .unwrap_or_default();
        assert!(message.contains("shape error"));
    }

    #[wasm_bindgen_test]
    fn classify_rejects_non_planar_systems() {
        let wasm = WasmLinearSystem::new(1, vec![-1.0]).expect("system");
        assert!(wasm.classify().is_err());
    }

    #[wasm_bindgen_test]
    fn trajectory_serializes() {
        let wasm = WasmLinearSystem::new(2, vec![2.0, -5.0, 1.0, -2.0]).expect("system");
        let value = wasm
            .solve_trajectory(vec![-0.1, 0.2], 0.1, 6.0, 0.0, 0.0)
            .expect("trajectory");
        assert!(value.is_object());
    }
}
