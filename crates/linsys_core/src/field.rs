//! Planar vector field sampling for stream plots.

use crate::error::{ConfigError, LinsysError};
use crate::grid::GridRange;
use crate::linear::LinearSystem;
use nalgebra::DMatrix;

/// Derivatives of a planar linear system over a square meshgrid.
///
/// All grids share one shape: row `i` follows `x2 = values[i]`, column `j`
/// follows `x1 = values[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    pub x1: DMatrix<f64>,
    pub x2: DMatrix<f64>,
    pub x1dot: DMatrix<f64>,
    pub x2dot: DMatrix<f64>,
    /// `2 log1p(|derivative|)`, finite at the origin where the field vanishes.
    pub color: DMatrix<f64>,
}

impl VectorField {
    pub fn shape(&self) -> (usize, usize) {
        self.x1.shape()
    }

    /// `(x1, x2, x1dot, x2dot, color)` at one grid node.
    pub fn at(&self, row: usize, col: usize) -> (f64, f64, f64, f64, f64) {
        (
            self.x1[(row, col)],
            self.x2[(row, col)],
            self.x1dot[(row, col)],
            self.x2dot[(row, col)],
            self.color[(row, col)],
        )
    }

    pub fn max_color(&self) -> f64 {
        self.color.iter().copied().fold(0.0, f64::max)
    }
}

/// Evaluates `A x` on every node of the square grid spanned by `range`.
pub fn sample_vector_field(
    matrix: &DMatrix<f64>,
    range: &GridRange,
) -> Result<VectorField, LinsysError> {
    let system = LinearSystem::new(matrix.clone())?;
    if matrix.nrows() != 2 {
        return Err(ConfigError::DimensionMismatch {
            expected: 2,
            got: matrix.nrows(),
        }
        .into());
    }
    let values = range.values()?;
    let n = values.len();

    let x1 = DMatrix::from_fn(n, n, |_, j| values[j]);
    let x2 = DMatrix::from_fn(n, n, |i, _| values[i]);
    let mut x1dot = DMatrix::zeros(n, n);
    let mut x2dot = DMatrix::zeros(n, n);
    let mut color = DMatrix::zeros(n, n);

    for i in 0..n {
        for j in 0..n {
            let derivative = system.derivative(0.0, &[x1[(i, j)], x2[(i, j)]])?;
            let magnitude = (derivative[0] * derivative[0] + derivative[1] * derivative[1]).sqrt();
            x1dot[(i, j)] = derivative[0];
            x2dot[(i, j)] = derivative[1];
            color[(i, j)] = 2.0 * magnitude.ln_1p();
        }
    }

    Ok(VectorField {
        x1,
        x2,
        x1dot,
        x2dot,
        color,
    })
}
