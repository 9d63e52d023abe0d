//! Time grids and spatial grid ranges.

use crate::error::{validate_step_and_duration, ConfigError, LinsysError};
use serde::{Deserialize, Serialize};

/// Relative distance to an integer under which a ratio is treated as that integer.
const GRID_SNAP: f64 = 1e-9;
/// Largest number of samples a single grid may hold.
pub const MAX_GRID_POINTS: usize = 100_000_000;

/// Number of points in `[0, T)` at spacing `dt`.
///
/// Ratios that land within `GRID_SNAP` of an integer are snapped first, so
/// `6.0 / 0.1` yields 60 points even though it evaluates to 59.999...
pub fn time_grid_len(dt: f64, t_final: f64) -> Result<usize, LinsysError> {
    validate_step_and_duration(dt, t_final)?;
    let ratio = t_final / dt;
    let len = snapped_count(ratio, f64::ceil).ok_or_else(|| {
        ConfigError::InvalidGrid(format!(
            "T / dt = {ratio} exceeds {MAX_GRID_POINTS} time points"
        ))
    })?;
    Ok(len.max(1))
}

/// Builds `t_k = k * dt` for `k = 0 .. time_grid_len(dt, T)`.
pub fn time_grid(dt: f64, t_final: f64) -> Result<Vec<f64>, LinsysError> {
    let len = time_grid_len(dt, t_final)?;
    Ok((0..len).map(|k| k as f64 * dt).collect())
}

/// Snaps `ratio` to a nearby integer, otherwise rounds it with `round`.
/// `None` when the result is non-finite or larger than `MAX_GRID_POINTS`.
fn snapped_count(ratio: f64, round: fn(f64) -> f64) -> Option<usize> {
    if !ratio.is_finite() || ratio < 0.0 {
        return None;
    }
    let nearest = ratio.round();
    let count = if (ratio - nearest).abs() <= GRID_SNAP * nearest.max(1.0) {
        nearest
    } else {
        round(ratio)
    };
    if count > MAX_GRID_POINTS as f64 {
        return None;
    }
    Some(count as usize)
}

/// Inclusive, evenly spaced range of axis values: `start, start + step, ..., stop`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Default for GridRange {
    fn default() -> Self {
        Self {
            start: -20.0,
            stop: 20.0,
            step: 1.0,
        }
    }
}

impl GridRange {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.start.is_finite() || !self.stop.is_finite() {
            return Err(ConfigError::InvalidGrid(format!(
                "bounds must be finite (got {} to {})",
                self.start, self.stop
            )));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(ConfigError::InvalidGrid(format!(
                "step must be positive (got {})",
                self.step
            )));
        }
        if self.stop < self.start {
            return Err(ConfigError::InvalidGrid(format!(
                "stop {} lies below start {}",
                self.stop, self.start
            )));
        }
        Ok(())
    }

    /// Number of samples along the axis, both ends included.
    pub fn count(&self) -> Result<usize, ConfigError> {
        self.validate()?;
        let ratio = (self.stop - self.start) / self.step;
        match snapped_count(ratio, f64::floor) {
            Some(intervals) if intervals < MAX_GRID_POINTS => Ok(intervals + 1),
            _ => Err(ConfigError::InvalidGrid(format!(
                "({} - {}) / {} exceeds {MAX_GRID_POINTS} points",
                self.stop, self.start, self.step
            ))),
        }
    }

    pub fn values(&self) -> Result<Vec<f64>, ConfigError> {
        let len = self.count()?;
        Ok((0..len)
            .map(|i| self.start + i as f64 * self.step)
            .collect())
    }
}
