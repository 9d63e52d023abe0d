use crate::error::LinsysError;
use crate::solvers::DenseSolution;

/// Represents a continuous-time dynamical system (flow).
pub trait DynamicalSystem {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt into
    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]);
}

/// An integrator that advances a system over a time span and returns a
/// continuously evaluable solution.
///
/// Step-size control and error tolerances belong to the implementation; callers
/// only see the dense solution or an integration error.
pub trait DenseOutputSolver {
    fn solve_dense(
        &mut self,
        system: &dyn DynamicalSystem,
        t_span: (f64, f64),
        y0: &[f64],
    ) -> Result<DenseSolution, LinsysError>;
}
