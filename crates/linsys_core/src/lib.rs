pub mod eigen;
pub mod error;
pub mod euler;
pub mod field;
pub mod grid;
pub mod linear;
pub mod render;
pub mod scenarios;
pub mod solvers;
pub mod trajectory;
/// The `linsys_core` crate provides the numerical engine for exploring linear dynamical systems.
/// It covers the scalar exponential `dx/dt = a x` and n-dimensional flows `dx/dt = A x`.
///
/// Key components:
/// - **Traits**: `DynamicalSystem` (vector fields) and `DenseOutputSolver` (adaptive integrators).
/// - **Euler**: explicit forward-Euler stepping of the complex scalar exponential.
/// - **Solvers**: Dormand-Prince 5(4) with dense output, driven by `trajectory` on a fixed time grid.
/// - **Field / Eigen**: vector field sampling over a spatial grid and eigenstructure of the system matrix.
/// - **Scenarios**: figure payloads for an external `Renderer`.
pub mod traits;

pub use error::{ConfigError, IntegrationFailure, LinsysError};
