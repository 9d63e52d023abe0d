use crate::error::{ConfigError, LinsysError};
use crate::traits::DynamicalSystem;
use nalgebra::{DMatrix, DVector};

/// `dx/dt = A x` for a fixed square matrix `A`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    matrix: DMatrix<f64>,
}

impl LinearSystem {
    pub fn new(matrix: DMatrix<f64>) -> Result<Self, LinsysError> {
        validate_square(&matrix)?;
        Ok(Self { matrix })
    }

    /// Builds the system from row-major entries.
    pub fn from_row_slice(dim: usize, entries: &[f64]) -> Result<Self, LinsysError> {
        if entries.len() != dim * dim {
            return Err(ConfigError::MatrixEntries {
                dim,
                expected: dim * dim,
                got: entries.len(),
            }
            .into());
        }
        Self::new(DMatrix::from_row_slice(dim, dim, entries))
    }

    /// The 2-D system with `A = [[a00, a01], [a10, a11]]`.
    pub fn planar(a00: f64, a01: f64, a10: f64, a11: f64) -> Self {
        Self {
            matrix: DMatrix::from_row_slice(2, 2, &[a00, a01, a10, a11]),
        }
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn trace(&self) -> f64 {
        self.matrix.trace()
    }

    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    /// `A x`; `t` is accepted for solver compatibility and ignored.
    pub fn derivative(&self, t: f64, x: &[f64]) -> Result<Vec<f64>, LinsysError> {
        let dim = self.dimension();
        if x.len() != dim {
            return Err(LinsysError::Shape {
                expected: dim,
                got: x.len(),
            });
        }
        let mut out = vec![0.0; dim];
        self.apply(t, x, &mut out);
        Ok(out)
    }
}

impl DynamicalSystem for LinearSystem {
    fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let dim = self.matrix.nrows();
        for i in 0..dim {
            let mut acc = 0.0;
            for j in 0..dim {
                acc += self.matrix[(i, j)] * x[j];
            }
            out[i] = acc;
        }
    }
}

/// Computes `A x` for an arbitrary square matrix.
///
/// The time argument mirrors the `f(t, x)` signature expected by ODE solvers.
pub fn derivative(_t: f64, x: &[f64], a: &DMatrix<f64>) -> Result<Vec<f64>, LinsysError> {
    validate_square(a)?;
    if x.len() != a.nrows() {
        return Err(LinsysError::Shape {
            expected: a.nrows(),
            got: x.len(),
        });
    }
    let product = a * DVector::from_column_slice(x);
    Ok(product.iter().copied().collect())
}

pub(crate) fn validate_square(matrix: &DMatrix<f64>) -> Result<(), ConfigError> {
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return Err(ConfigError::EmptyMatrix);
    }
    if matrix.nrows() != matrix.ncols() {
        return Err(ConfigError::NonSquareMatrix {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
        });
    }
    Ok(())
}
