//! Error types shared by every numerical routine in the crate.

use thiserror::Error;

/// Invalid parameters supplied by the caller. Nothing was computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("step size dt must be positive and finite (got {0})")]
    NonPositiveStep(f64),
    #[error("duration T must be positive and finite (got {0})")]
    NonPositiveDuration(f64),
    #[error("system matrix must be square (got {rows}x{cols})")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("system matrix has zero dimension")]
    EmptyMatrix,
    #[error("a {dim}x{dim} system matrix needs {expected} entries (got {got})")]
    MatrixEntries {
        dim: usize,
        expected: usize,
        got: usize,
    },
    #[error("initial condition has dimension {got}, system expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("invalid grid range: {0}")]
    InvalidGrid(String),
    #[error("invalid solver settings: {0}")]
    InvalidSettings(String),
}

/// Why the adaptive solver gave up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationFailure {
    #[error("step size {h:e} fell below machine resolution")]
    StepSizeTooSmall { h: f64 },
    #[error("step budget of {max_steps} steps exhausted")]
    MaxStepsExceeded { max_steps: usize },
    #[error("state became non-finite")]
    NonFiniteState,
    #[error("requested time lies outside the solved span [{start}, {end}]")]
    OutOfSpan { start: f64, end: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinsysError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("shape error: state has dimension {got}, matrix expects {expected}")]
    Shape { expected: usize, got: usize },
    #[error("integration error at t = {t}: {reason}")]
    Integration { t: f64, reason: IntegrationFailure },
    #[error("failed to compute eigenvector for eigenvalue index {index}")]
    Decomposition { index: usize },
}

impl LinsysError {
    pub(crate) fn integration(t: f64, reason: IntegrationFailure) -> Self {
        Self::Integration { t, reason }
    }
}

/// Rejects non-positive or non-finite `dt` and `T`.
pub(crate) fn validate_step_and_duration(dt: f64, t_final: f64) -> Result<(), ConfigError> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(ConfigError::NonPositiveStep(dt));
    }
    if !(t_final.is_finite() && t_final > 0.0) {
        return Err(ConfigError::NonPositiveDuration(t_final));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_offending_values() {
        let err = LinsysError::from(ConfigError::NonPositiveStep(-0.5));
        assert_eq!(
            err.to_string(),
            "configuration error: step size dt must be positive and finite (got -0.5)"
        );

        let err = LinsysError::Shape {
            expected: 2,
            got: 3,
        };
        assert!(err.to_string().contains("dimension 3"));

        let err = LinsysError::integration(
            1.5,
            IntegrationFailure::MaxStepsExceeded { max_steps: 10 },
        );
        assert!(err.to_string().contains("t = 1.5"));
        assert!(err.to_string().contains("10 steps"));
    }

    #[test]
    fn step_and_duration_validation() {
        assert!(validate_step_and_duration(0.1, 1.0).is_ok());
        assert_eq!(
            validate_step_and_duration(0.0, 1.0),
            Err(ConfigError::NonPositiveStep(0.0))
        );
        assert_eq!(
            validate_step_and_duration(0.1, -2.0),
            Err(ConfigError::NonPositiveDuration(-2.0))
        );
        assert!(validate_step_and_duration(f64::NAN, 1.0).is_err());
        assert!(validate_step_and_duration(0.1, f64::INFINITY).is_err());
    }
}
