use crate::error::{ConfigError, IntegrationFailure, LinsysError};
use crate::traits::{DenseOutputSolver, DynamicalSystem};
use serde::{Deserialize, Serialize};

const UROUND: f64 = 2.3e-16;
/// Lund stabilization exponent.
const BETA: f64 = 0.04;
/// Step ratio bounds: hnew / h stays within [MIN_FACTOR, MAX_FACTOR].
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
    pub safety: f64,
    pub initial_step: Option<f64>,
    pub max_step: Option<f64>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-6,
            max_steps: 100_000,
            safety: 0.9,
            initial_step: None,
            max_step: None,
        }
    }
}

impl SolverSettings {
    /// Tight tolerances for reference solutions.
    pub fn precise() -> Self {
        Self {
            rtol: 1e-10,
            atol: 1e-12,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return Err(ConfigError::InvalidSettings(format!(
                "rtol must be positive (got {})",
                self.rtol
            )));
        }
        if !(self.atol.is_finite() && self.atol > 0.0) {
            return Err(ConfigError::InvalidSettings(format!(
                "atol must be positive (got {})",
                self.atol
            )));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidSettings(
                "max_steps must be greater than zero".to_string(),
            ));
        }
        if !(self.safety > 1e-4 && self.safety < 1.0) {
            return Err(ConfigError::InvalidSettings(format!(
                "safety factor must lie in (1e-4, 1) (got {})",
                self.safety
            )));
        }
        for (name, value) in [
            ("initial_step", self.initial_step),
            ("max_step", self.max_step),
        ] {
            if let Some(h) = value {
                if !(h.is_finite() && h > 0.0) {
                    return Err(ConfigError::InvalidSettings(format!(
                        "{name} must be positive (got {h})"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverStats {
    pub evaluations: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// One accepted step's interpolation coefficients.
#[derive(Debug, Clone)]
struct Segment {
    t_old: f64,
    h: f64,
    cont: Vec<f64>,
}

impl Segment {
    fn t_end(&self) -> f64 {
        self.t_old + self.h
    }
}

/// Piecewise quartic interpolant over every accepted step.
#[derive(Debug, Clone)]
pub struct DenseSolution {
    dim: usize,
    segments: Vec<Segment>,
    stats: SolverStats,
}

impl DenseSolution {
    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    pub fn t_span(&self) -> Option<(f64, f64)> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        Some((first.t_old, last.t_end()))
    }

    pub fn evaluate(&self, t: f64) -> Result<Vec<f64>, LinsysError> {
        let mut out = vec![0.0; self.dim];
        self.evaluate_into(t, &mut out)?;
        Ok(out)
    }

    pub fn evaluate_into(&self, t: f64, out: &mut [f64]) -> Result<(), LinsysError> {
        let segment = self.find_segment(t)?;
        let n = self.dim;
        let cont = &segment.cont;
        let theta = (t - segment.t_old) / segment.h;
        let theta1 = 1.0 - theta;
        for i in 0..n {
            out[i] = cont[i]
                + theta
                    * (cont[n + i]
                        + theta1
                            * (cont[2 * n + i]
                                + theta * (cont[3 * n + i] + theta1 * cont[4 * n + i])));
        }
        Ok(())
    }

    fn find_segment(&self, t: f64) -> Result<&Segment, LinsysError> {
        let (start, end) = self.t_span().ok_or(LinsysError::integration(
            t,
            IntegrationFailure::OutOfSpan {
                start: f64::NAN,
                end: f64::NAN,
            },
        ))?;
        let slack = 1e-12 * start.abs().max(end.abs()).max(1.0);
        if !(t >= start - slack && t <= end + slack) {
            return Err(LinsysError::integration(
                t,
                IntegrationFailure::OutOfSpan { start, end },
            ));
        }
        let idx = self
            .segments
            .partition_point(|segment| segment.t_end() < t)
            .min(self.segments.len() - 1);
        Ok(&self.segments[idx])
    }
}

/// Dormand-Prince 5(4) with embedded error control and dense output.
pub struct Dopri5 {
    settings: SolverSettings,
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    k5: Vec<f64>,
    k6: Vec<f64>,
    k7: Vec<f64>,
    y1: Vec<f64>,
}

impl Default for Dopri5 {
    fn default() -> Self {
        Self::new(SolverSettings::default())
    }
}

impl Dopri5 {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            k1: Vec::new(),
            k2: Vec::new(),
            k3: Vec::new(),
            k4: Vec::new(),
            k5: Vec::new(),
            k6: Vec::new(),
            k7: Vec::new(),
            y1: Vec::new(),
        }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn resize(&mut self, dim: usize) {
        for buffer in [
            &mut self.k1,
            &mut self.k2,
            &mut self.k3,
            &mut self.k4,
            &mut self.k5,
            &mut self.k6,
            &mut self.k7,
            &mut self.y1,
        ] {
            buffer.clear();
            buffer.resize(dim, 0.0);
        }
    }

    /// Hairer's starting step guess. Expects `k1 = f(t, y)` and uses `k2`/`y1`
    /// as scratch.
    fn initial_step(&mut self, system: &dyn DynamicalSystem, t: f64, y: &[f64], h_max: f64) -> f64 {
        let n = y.len();
        let SolverSettings { rtol, atol, .. } = self.settings;
        let mut dnf = 0.0_f64;
        let mut dny = 0.0_f64;
        for i in 0..n {
            let sk = atol + rtol * y[i].abs();
            dnf += (self.k1[i] / sk) * (self.k1[i] / sk);
            dny += (y[i] / sk) * (y[i] / sk);
        }

        let mut h = if dnf <= 1e-10 || dny <= 1e-10 {
            1.0e-6
        } else {
            (dny / dnf).sqrt() * 0.01
        };
        h = h.min(h_max);

        // Explicit Euler probe for the second derivative
        for i in 0..n {
            self.y1[i] = y[i] + h * self.k1[i];
        }
        system.apply(t + h, &self.y1, &mut self.k2);

        let mut der2 = 0.0_f64;
        for i in 0..n {
            let sk = atol + rtol * y[i].abs();
            let df = (self.k2[i] - self.k1[i]) / sk;
            der2 += df * df;
        }
        der2 = der2.sqrt() / h;

        let der12 = der2.max(dnf.sqrt());
        let h1 = if der12 <= 1.0e-15 {
            (1.0e-6_f64).max(h * 1.0e-3)
        } else {
            (0.01 / der12).powf(1.0 / 5.0)
        };
        (100.0 * h).min(h1).min(h_max)
    }

    fn integrate(
        &mut self,
        system: &dyn DynamicalSystem,
        t0: f64,
        t_end: f64,
        y0: &[f64],
    ) -> Result<DenseSolution, LinsysError> {
        self.settings.validate()?;
        let n = system.dimension();
        if n == 0 {
            return Err(ConfigError::EmptyMatrix.into());
        }
        if y0.len() != n {
            return Err(ConfigError::DimensionMismatch {
                expected: n,
                got: y0.len(),
            }
            .into());
        }
        if !t0.is_finite() || !t_end.is_finite() || t_end <= t0 {
            return Err(ConfigError::NonPositiveDuration(t_end - t0).into());
        }
        if y0.iter().any(|v| !v.is_finite()) {
            return Err(LinsysError::integration(
                t0,
                IntegrationFailure::NonFiniteState,
            ));
        }

        self.resize(n);
        let SolverSettings {
            rtol,
            atol,
            max_steps,
            safety,
            ..
        } = self.settings;
        let h_max = self.settings.max_step.unwrap_or(t_end - t0).min(t_end - t0);
        let facc1 = 1.0 / MIN_FACTOR;
        let facc2 = 1.0 / MAX_FACTOR;
        let expo1 = 0.2 - BETA * 0.75;

        let mut stats = SolverStats::default();
        let mut segments = Vec::new();
        let mut y = y0.to_vec();
        let mut t = t0;

        system.apply(t, &y, &mut self.k1);
        stats.evaluations += 1;
        let mut h = match self.settings.initial_step {
            Some(h0) => h0.min(h_max),
            None => {
                stats.evaluations += 1;
                self.initial_step(system, t, &y, h_max)
            }
        };

        let mut fac_old: f64 = 1e-4;
        let mut last = false;
        let mut reject = false;
        let mut steps = 0usize;

        loop {
            if steps >= max_steps {
                log::debug!("dopri5 gave up at t = {t} after {steps} steps");
                return Err(LinsysError::integration(
                    t,
                    IntegrationFailure::MaxStepsExceeded { max_steps },
                ));
            }
            if 0.1 * h.abs() <= t.abs() * UROUND {
                return Err(LinsysError::integration(
                    t,
                    IntegrationFailure::StepSizeTooSmall { h },
                ));
            }
            if t + 1.01 * h - t_end > 0.0 {
                h = t_end - t;
                last = true;
            }
            steps += 1;

            for i in 0..n {
                self.y1[i] = y[i] + h * A21 * self.k1[i];
            }
            system.apply(t + C2 * h, &self.y1, &mut self.k2);

            for i in 0..n {
                self.y1[i] = y[i] + h * (A31 * self.k1[i] + A32 * self.k2[i]);
            }
            system.apply(t + C3 * h, &self.y1, &mut self.k3);

            for i in 0..n {
                self.y1[i] = y[i] + h * (A41 * self.k1[i] + A42 * self.k2[i] + A43 * self.k3[i]);
            }
            system.apply(t + C4 * h, &self.y1, &mut self.k4);

            for i in 0..n {
                self.y1[i] = y[i]
                    + h * (A51 * self.k1[i]
                        + A52 * self.k2[i]
                        + A53 * self.k3[i]
                        + A54 * self.k4[i]);
            }
            system.apply(t + C5 * h, &self.y1, &mut self.k5);

            for i in 0..n {
                self.y1[i] = y[i]
                    + h * (A61 * self.k1[i]
                        + A62 * self.k2[i]
                        + A63 * self.k3[i]
                        + A64 * self.k4[i]
                        + A65 * self.k5[i]);
            }
            let t_next = t + h;
            system.apply(t_next, &self.y1, &mut self.k6);

            // 5th order solution, FSAL stage
            for i in 0..n {
                self.y1[i] = y[i]
                    + h * (A71 * self.k1[i]
                        + A73 * self.k3[i]
                        + A74 * self.k4[i]
                        + A75 * self.k5[i]
                        + A76 * self.k6[i]);
            }
            system.apply(t_next, &self.y1, &mut self.k7);
            stats.evaluations += 6;

            let mut err = 0.0_f64;
            for i in 0..n {
                let e = h
                    * (E1 * self.k1[i]
                        + E3 * self.k3[i]
                        + E4 * self.k4[i]
                        + E5 * self.k5[i]
                        + E6 * self.k6[i]
                        + E7 * self.k7[i]);
                let sk = atol + rtol * y[i].abs().max(self.y1[i].abs());
                err += (e / sk) * (e / sk);
            }
            err = (err / n as f64).sqrt();

            // Overflow cannot be cured by shrinking the step.
            if !err.is_finite() || self.y1.iter().any(|v| !v.is_finite()) {
                log::debug!("dopri5 produced a non-finite state at t = {t}");
                return Err(LinsysError::integration(
                    t,
                    IntegrationFailure::NonFiniteState,
                ));
            }

            let fac11 = err.powf(expo1);
            let fac = facc2.max(facc1.min(fac11 / fac_old.powf(BETA) / safety));
            let mut h_new = h / fac;

            if err <= 1.0 {
                fac_old = err.max(1e-4);
                stats.accepted += 1;

                let mut cont = vec![0.0; 5 * n];
                for i in 0..n {
                    let ydiff = self.y1[i] - y[i];
                    let bspl = h * self.k1[i] - ydiff;
                    cont[i] = y[i];
                    cont[n + i] = ydiff;
                    cont[2 * n + i] = bspl;
                    cont[3 * n + i] = -h * self.k7[i] + ydiff - bspl;
                    cont[4 * n + i] = h
                        * (D1 * self.k1[i]
                            + D3 * self.k3[i]
                            + D4 * self.k4[i]
                            + D5 * self.k5[i]
                            + D6 * self.k6[i]
                            + D7 * self.k7[i]);
                }
                segments.push(Segment { t_old: t, h, cont });

                self.k1.copy_from_slice(&self.k7);
                y.copy_from_slice(&self.y1);
                t = t_next;

                if last {
                    break;
                }
                if h_new > h_max {
                    h_new = h_max;
                }
                if reject {
                    h_new = h_new.min(h);
                    reject = false;
                }
            } else {
                h_new = h / facc1.min(fac11 / safety);
                reject = true;
                if stats.accepted >= 1 {
                    stats.rejected += 1;
                }
                last = false;
            }
            h = h_new;
        }

        log::debug!(
            "dopri5 reached t = {t}: {} accepted, {} rejected, {} evaluations",
            stats.accepted,
            stats.rejected,
            stats.evaluations
        );
        Ok(DenseSolution {
            dim: n,
            segments,
            stats,
        })
    }
}

impl DenseOutputSolver for Dopri5 {
    fn solve_dense(
        &mut self,
        system: &dyn DynamicalSystem,
        t_span: (f64, f64),
        y0: &[f64],
    ) -> Result<DenseSolution, LinsysError> {
        self.integrate(system, t_span.0, t_span.1, y0)
    }
}

// Dormand-Prince 5(4) tableau
const C2: f64 = 0.2;
const C3: f64 = 0.3;
const C4: f64 = 0.8;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 0.2;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

// Difference between the 5th and embedded 4th order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

// Dense output weights
const D1: f64 = -12715105075.0 / 11282082432.0;
const D3: f64 = 87487479700.0 / 32700410799.0;
const D4: f64 = -10690763975.0 / 1880347072.0;
const D5: f64 = 701980252875.0 / 199316789632.0;
const D6: f64 = -1453857185.0 / 822651844.0;
const D7: f64 = 69997945.0 / 29380423.0;
