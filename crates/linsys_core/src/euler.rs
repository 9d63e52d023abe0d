//! Explicit forward-Euler integration of `dx/dt = a x`.
//!
//! One explicit update per grid point, no step-size control. Stable only while
//! `|1 + a dt| <= 1`.

use crate::error::LinsysError;
use crate::grid::time_grid;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExponentialTrajectory {
    pub a: Complex64,
    pub states: Vec<Complex64>,
    pub times: Vec<f64>,
}

impl ExponentialTrajectory {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn real_parts(&self) -> Vec<f64> {
        self.states.iter().map(|x| x.re).collect()
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        self.states.iter().map(|x| x.norm()).collect()
    }

    /// `x0 exp(a t)` at every grid time.
    pub fn analytic(&self) -> Vec<Complex64> {
        let x0 = self.states.first().copied().unwrap_or_default();
        self.times
            .iter()
            .map(|&t| x0 * (self.a * t).exp())
            .collect()
    }

    /// Largest pointwise distance to the analytic solution.
    pub fn max_abs_error(&self) -> f64 {
        self.states
            .iter()
            .zip(self.analytic())
            .map(|(x, exact)| (x - exact).norm())
            .fold(0.0, f64::max)
    }
}

/// Integrates `dx/dt = a x` from `x0` with forward Euler on the grid `[0, T)`.
///
/// `x[k] = x[k-1] + (a x[k-1]) dt`; complex `a` and `x0` go through the same
/// update as real ones.
pub fn integrate_exponential(
    a: impl Into<Complex64>,
    x0: impl Into<Complex64>,
    dt: f64,
    t_final: f64,
) -> Result<ExponentialTrajectory, LinsysError> {
    let a = a.into();
    let x0 = x0.into();
    let times = time_grid(dt, t_final)?;

    let mut states = Vec::with_capacity(times.len());
    states.push(x0);
    for k in 1..times.len() {
        let previous = states[k - 1];
        let xdot = a * previous;
        states.push(previous + xdot * dt);
    }

    log::debug!(
        "euler: a = {a}, x0 = {x0}, dt = {dt}, T = {t_final}, {} steps",
        states.len()
    );
    Ok(ExponentialTrajectory { a, states, times })
}

/// Whether forward Euler with step `dt` is stable for `dx/dt = a x`.
pub fn euler_is_stable(a: impl Into<Complex64>, dt: f64) -> bool {
    (Complex64::new(1.0, 0.0) + a.into() * dt).norm() <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use proptest::prelude::*;

    #[test]
    fn zero_rate_keeps_initial_value_exactly() {
        let x0 = Complex64::new(0.3, -1.7);
        let result = integrate_exponential(0.0, x0, 0.01, 2.0).expect("euler");
        assert_eq!(result.len(), 200);
        assert!(result.states.iter().all(|&x| x == x0));
    }

    #[test]
    fn first_state_is_initial_condition() {
        let result = integrate_exponential(-3.0, 2.5, 0.1, 1.0).expect("euler");
        assert_eq!(result.states[0], Complex64::new(2.5, 0.0));
        assert_eq!(result.times[0], 0.0);
        assert_eq!(result.states.len(), result.times.len());
    }

    #[test]
    fn single_update_matches_formula() {
        let result = integrate_exponential(-0.5, 1.0, 0.1, 0.3).expect("euler");
        let expected = [1.0, 0.95, 0.9025];
        for (x, e) in result.states.iter().zip(expected) {
            assert!((x.re - e).abs() < 1e-15);
            assert_eq!(x.im, 0.0);
        }
    }

    #[test]
    fn complex_rate_rotates_state() {
        // a = i: each step multiplies by (1 + i dt), so |x| grows by sqrt(1 + dt^2)
        let dt = 0.01;
        let result = integrate_exponential(Complex64::new(0.0, 1.0), 1.0, dt, 1.0).expect("euler");
        let growth = (1.0 + dt * dt).sqrt();
        for (k, magnitude) in result.magnitudes().iter().enumerate() {
            assert!((magnitude - growth.powi(k as i32)).abs() < 1e-12);
        }
        let last = result.states.last().unwrap();
        assert!(last.im > 0.0);
    }

    #[test]
    fn rejects_non_positive_parameters() {
        assert_eq!(
            integrate_exponential(1.0, 1.0, 0.0, 1.0),
            Err(LinsysError::Config(ConfigError::NonPositiveStep(0.0)))
        );
        assert_eq!(
            integrate_exponential(1.0, 1.0, 0.1, -1.0),
            Err(LinsysError::Config(ConfigError::NonPositiveDuration(-1.0)))
        );
    }

    #[test]
    fn stability_criterion() {
        assert!(euler_is_stable(-0.5, 0.001));
        assert!(euler_is_stable(-10.0, 0.2));
        assert!(!euler_is_stable(-10.0, 0.25));
        assert!(!euler_is_stable(0.5, 0.001));
        assert!(euler_is_stable(0.0, 1.0));
    }

    #[test]
    fn unstable_step_makes_decay_oscillate_and_grow() {
        let result = integrate_exponential(-10.0, 1.0, 0.25, 5.0).expect("euler");
        let magnitudes = result.magnitudes();
        assert!(magnitudes.windows(2).all(|w| w[1] > w[0]));
        assert!(result.states[1].re < 0.0);
    }

    #[test]
    fn global_error_shrinks_linearly_with_step() {
        let coarse = integrate_exponential(-1.0, 1.0, 0.01, 2.0).expect("euler");
        let fine = integrate_exponential(-1.0, 1.0, 0.001, 2.0).expect("euler");
        let coarse_err = coarse.max_abs_error();
        let fine_err = fine.max_abs_error();
        assert!(coarse_err < 0.01);
        assert!(fine_err < 0.001);
        let ratio = coarse_err / fine_err;
        assert!(ratio > 8.0 && ratio < 12.0, "error ratio {ratio}");
    }

    proptest! {
        #[test]
        fn decay_magnitude_never_increases(
            a in -5.0f64..-0.01,
            dt in 0.001f64..0.1,
            t_final in 0.5f64..5.0,
            x0 in -10.0f64..10.0,
        ) {
            let result = integrate_exponential(a, x0, dt, t_final).unwrap();
            let magnitudes = result.magnitudes();
            for w in magnitudes.windows(2) {
                prop_assert!(w[1] <= w[0]);
            }
        }

        #[test]
        fn growth_magnitude_strictly_increases(
            a in 0.01f64..5.0,
            dt in 0.001f64..0.1,
            t_final in 0.5f64..5.0,
            x0 in prop_oneof![-10.0f64..-0.01, 0.01f64..10.0],
        ) {
            let result = integrate_exponential(a, x0, dt, t_final).unwrap();
            let magnitudes = result.magnitudes();
            for w in magnitudes.windows(2) {
                prop_assert!(w[1] > w[0]);
            }
        }

        #[test]
        fn length_matches_whole_step_count(steps in 1usize..2000, t_final in 0.1f64..20.0) {
            let dt = t_final / steps as f64;
            let result = integrate_exponential(0.3, 1.0, dt, t_final).unwrap();
            prop_assert_eq!(result.states.len(), steps);
            prop_assert_eq!(result.times.len(), steps);
        }
    }
}
