use crate::error::{ConfigError, LinsysError};
use crate::grid::time_grid;
use crate::solvers::{Dopri5, SolverStats};
use crate::traits::{DenseOutputSolver, DynamicalSystem};
use nalgebra::DMatrix;

/// States of an n-dimensional system sampled on a fixed time grid.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub times: Vec<f64>,
    /// Column-major `n x times.len()` values; column `k` is the state at `times[k]`.
    pub states: DMatrix<f64>,
    pub stats: SolverStats,
}

impl Trajectory {
    pub fn dimension(&self) -> usize {
        self.states.nrows()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time series of one state variable.
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.states.row(index).iter().copied().collect()
    }

    /// State vector at grid index `k`.
    pub fn point(&self, k: usize) -> Vec<f64> {
        self.states.column(k).iter().copied().collect()
    }

    pub fn final_state(&self) -> Vec<f64> {
        self.point(self.len() - 1)
    }

    /// Opacity ramp `t / t_last`, used to show the direction of time in scatter plots.
    pub fn time_colors(&self) -> Vec<f64> {
        let t_last = self.times.last().copied().unwrap_or(0.0);
        if t_last <= 0.0 {
            return vec![1.0; self.times.len()];
        }
        self.times.iter().map(|t| t / t_last).collect()
    }
}

/// Integrates `system` from `x0` with the default adaptive solver and samples
/// the dense solution on the grid `[0, T)` with spacing `dt`.
pub fn solve_trajectory(
    system: &dyn DynamicalSystem,
    x0: &[f64],
    dt: f64,
    t_final: f64,
) -> Result<Trajectory, LinsysError> {
    solve_trajectory_with(&mut Dopri5::default(), system, x0, dt, t_final)
}

/// Same as [`solve_trajectory`] with a caller-supplied solver.
pub fn solve_trajectory_with(
    solver: &mut dyn DenseOutputSolver,
    system: &dyn DynamicalSystem,
    x0: &[f64],
    dt: f64,
    t_final: f64,
) -> Result<Trajectory, LinsysError> {
    let dim = system.dimension();
    if x0.len() != dim {
        return Err(ConfigError::DimensionMismatch {
            expected: dim,
            got: x0.len(),
        }
        .into());
    }
    let times = time_grid(dt, t_final)?;

    let solution = solver.solve_dense(system, (0.0, t_final), x0)?;

    let mut states = DMatrix::zeros(dim, times.len());
    states.column_mut(0).copy_from_slice(x0);
    let mut buffer = vec![0.0; dim];
    for (k, &t) in times.iter().enumerate().skip(1) {
        solution.evaluate_into(t, &mut buffer)?;
        states.column_mut(k).copy_from_slice(&buffer);
    }

    Ok(Trajectory {
        times,
        states,
        stats: solution.stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntegrationFailure;
    use crate::linear::LinearSystem;
    use crate::solvers::SolverSettings;

    /// For `A = [[2, -5], [1, -2]]`, `A^2 = -I`, so `exp(A t) = I cos t + A sin t`.
    fn closed_orbit(t: f64, x0: &[f64]) -> [f64; 2] {
        let ax = [2.0 * x0[0] - 5.0 * x0[1], x0[0] - 2.0 * x0[1]];
        [
            t.cos() * x0[0] + t.sin() * ax[0],
            t.cos() * x0[1] + t.sin() * ax[1],
        ]
    }

    #[test]
    fn trajectory_aligns_with_time_grid() {
        let system = LinearSystem::planar(2.0, -5.0, 1.0, -2.0);
        let x0 = [-0.1, 0.2];
        let trajectory = solve_trajectory(&system, &x0, 0.1, 6.0).expect("trajectory");

        assert_eq!(trajectory.len(), 60);
        assert_eq!(trajectory.states.ncols(), 60);
        assert_eq!(trajectory.dimension(), 2);
        assert_eq!(trajectory.point(0), x0.to_vec());
        assert!((trajectory.times[59] - 5.9).abs() < 1e-12);
    }

    #[test]
    fn default_tolerances_track_the_closed_orbit() {
        let system = LinearSystem::planar(2.0, -5.0, 1.0, -2.0);
        let x0 = [-0.1, 0.2];
        let trajectory = solve_trajectory(&system, &x0, 0.1, 6.0).expect("trajectory");
        for (k, &t) in trajectory.times.iter().enumerate() {
            let exact = closed_orbit(t, &x0);
            let state = trajectory.point(k);
            assert!((state[0] - exact[0]).abs() < 2e-2, "x1 at t = {t}");
            assert!((state[1] - exact[1]).abs() < 2e-2, "x2 at t = {t}");
        }
    }

    #[test]
    fn precise_solver_matches_matrix_exponential() {
        let system = LinearSystem::planar(2.0, -5.0, 1.0, -2.0);
        let x0 = [-0.1, 0.2];
        let mut solver = Dopri5::new(SolverSettings::precise());
        let trajectory =
            solve_trajectory_with(&mut solver, &system, &x0, 0.05, 10.0).expect("trajectory");
        for (k, &t) in trajectory.times.iter().enumerate() {
            let exact = closed_orbit(t, &x0);
            let state = trajectory.point(k);
            assert!((state[0] - exact[0]).abs() < 1e-7);
            assert!((state[1] - exact[1]).abs() < 1e-7);
        }
    }

    #[test]
    fn component_and_time_colors() {
        let system = LinearSystem::planar(-1.0, 0.0, 0.0, -2.0);
        let trajectory = solve_trajectory(&system, &[1.0, 1.0], 0.5, 2.0).expect("trajectory");
        assert_eq!(trajectory.component(0).len(), 4);
        assert_eq!(trajectory.component(0)[0], 1.0);
        assert_eq!(trajectory.time_colors(), vec![0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]);
        assert!(trajectory.final_state()[1] < trajectory.final_state()[0]);
    }

    #[test]
    fn rejects_bad_configuration() {
        let system = LinearSystem::planar(1.0, 0.0, 0.0, 1.0);
        assert!(matches!(
            solve_trajectory(&system, &[1.0, 2.0, 3.0], 0.1, 1.0),
            Err(LinsysError::Config(ConfigError::DimensionMismatch {
                expected: 2,
                got: 3
            }))
        ));
        assert!(matches!(
            solve_trajectory(&system, &[1.0, 2.0], -0.1, 1.0),
            Err(LinsysError::Config(ConfigError::NonPositiveStep(_)))
        ));
        assert!(matches!(
            solve_trajectory(&system, &[1.0, 2.0], 0.1, 0.0),
            Err(LinsysError::Config(ConfigError::NonPositiveDuration(_)))
        ));
    }

    #[test]
    fn solver_failure_propagates() {
        let system = LinearSystem::planar(0.0, 1.0, -1.0, 0.0);
        let mut solver = Dopri5::new(SolverSettings {
            max_steps: 2,
            ..SolverSettings::precise()
        });
        let result = solve_trajectory_with(&mut solver, &system, &[1.0, 0.0], 0.1, 50.0);
        assert!(matches!(
            result,
            Err(LinsysError::Integration {
                reason: IntegrationFailure::MaxStepsExceeded { .. },
                ..
            })
        ));
    }
}
