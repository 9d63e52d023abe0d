//! Serializable payloads returned to JavaScript, and the pure functions that
//! build them from core results.

use anyhow::{Context, Result};
use linsys_core::eigen::{classify_planar, eigen_decompose, PlanarEquilibrium, Stability};
use linsys_core::euler::integrate_exponential;
use linsys_core::field::sample_vector_field;
use linsys_core::grid::GridRange;
use linsys_core::linear::LinearSystem;
use linsys_core::render::{Figure, FigureCollector, StreamGrid};
use linsys_core::scenarios::run_documented_scenarios;
use linsys_core::solvers::{Dopri5, SolverSettings, SolverStats};
use linsys_core::trajectory::solve_trajectory_with;
use num_complex::Complex64;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplexNumber {
    pub re: f64,
    pub im: f64,
}

impl From<Complex64> for ComplexNumber {
    fn from(value: Complex64) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EigenPairPayload {
    pub value: ComplexNumber,
    pub vector: Vec<ComplexNumber>,
    /// Real part of the eigenvector, the direction drawn on stream plots.
    pub direction: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EigenPayload {
    pub pairs: Vec<EigenPairPayload>,
    pub stability: Stability,
    pub label: String,
    /// Only set for 2x2 systems.
    pub equilibrium: Option<PlanarEquilibrium>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryPayload {
    pub times: Vec<f64>,
    /// One time series per state variable.
    pub components: Vec<Vec<f64>>,
    pub time_colors: Vec<f64>,
    pub stats: SolverStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExponentialPayload {
    pub times: Vec<f64>,
    pub states: Vec<ComplexNumber>,
    pub real: Vec<f64>,
    pub max_abs_error: f64,
}

pub fn eigen_payload(system: &LinearSystem) -> Result<EigenPayload> {
    let decomposition =
        eigen_decompose(system.matrix()).context("Failed to compute eigenvalues/eigenvectors")?;
    let equilibrium = if system.matrix().nrows() == 2 {
        Some(classify_planar(system.matrix())?)
    } else {
        None
    };
    Ok(EigenPayload {
        pairs: decomposition
            .pairs
            .iter()
            .map(|pair| EigenPairPayload {
                value: pair.value.into(),
                vector: pair.vector.iter().copied().map(ComplexNumber::from).collect(),
                direction: pair.real_direction(),
            })
            .collect(),
        stability: decomposition.stability(),
        label: decomposition.eigenvalue_label(),
        equilibrium,
    })
}

/// Samples `x(t)` on `[0, T)` with step `dt`. Non-positive tolerances fall
/// back to the solver defaults.
pub fn trajectory_payload(
    system: &LinearSystem,
    x0: &[f64],
    dt: f64,
    t_final: f64,
    rtol: f64,
    atol: f64,
) -> Result<TrajectoryPayload> {
    let defaults = SolverSettings::default();
    let settings = SolverSettings {
        rtol: if rtol > 0.0 { rtol } else { defaults.rtol },
        atol: if atol > 0.0 { atol } else { defaults.atol },
        ..defaults
    };
    let mut solver = Dopri5::new(settings);
    let trajectory = solve_trajectory_with(&mut solver, system, x0, dt, t_final)
        .context("Trajectory solve failed")?;

    let components = trajectory
        .states
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect();
    Ok(TrajectoryPayload {
        time_colors: trajectory.time_colors(),
        components,
        stats: trajectory.stats,
        times: trajectory.times,
    })
}

pub fn vector_field_payload(
    system: &LinearSystem,
    start: f64,
    stop: f64,
    step: f64,
) -> Result<StreamGrid> {
    let field = sample_vector_field(system.matrix(), &GridRange::new(start, stop, step))
        .context("Failed to sample vector field")?;
    Ok(StreamGrid::from(&field))
}

pub fn exponential_payload(
    a: Complex64,
    x0: Complex64,
    dt: f64,
    t_final: f64,
) -> Result<ExponentialPayload> {
    let run = integrate_exponential(a, x0, dt, t_final)
        .with_context(|| format!("Euler integration with a = {a} failed"))?;
    Ok(ExponentialPayload {
        real: run.real_parts(),
        max_abs_error: run.max_abs_error(),
        states: run.states.iter().copied().map(ComplexNumber::from).collect(),
        times: run.times,
    })
}

pub fn scenario_figures() -> Result<Vec<Figure>> {
    let mut collector = FigureCollector::default();
    run_documented_scenarios(&mut collector)?;
    Ok(collector.figures)
}
