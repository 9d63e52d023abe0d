//! Eigenstructure and stability of the system matrix.
//!
//! Eigenvectors come back unit-norm, but their sign (and, for complex
//! eigenvalues, their phase) is whatever the decomposition produced. Compare
//! directions up to scale, never component by component.

use crate::error::LinsysError;
use crate::linear::validate_square;
use nalgebra::linalg::SVD;
use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Relative size under which a real part or determinant counts as zero.
const ZERO_TOLERANCE: f64 = 1e-9;
/// Relative distance under which two eigenvalues are treated as one repeated value.
const CLUSTER_TOLERANCE: f64 = 1e-8;
/// Singular values of `A − λI` below this fraction of `‖A‖` span the eigenspace.
const NULL_TOLERANCE: f64 = 1e-8;
/// Norm a null vector must keep after orthogonalization to count as a new direction.
const INDEPENDENCE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenPair {
    pub value: Complex64,
    pub vector: Vec<Complex64>,
}

impl EigenPair {
    /// Real part of the eigenvector.
    ///
    /// For complex eigenvalues this drops the imaginary component, so the
    /// result is only a plotting direction, not an invariant subspace.
    pub fn real_direction(&self) -> Vec<f64> {
        self.vector.iter().map(|c| c.re).collect()
    }

    /// Real direction stretched by `scale`, e.g. for overlay arrows.
    pub fn scaled_real_direction(&self, scale: f64) -> Vec<f64> {
        self.vector.iter().map(|c| c.re * scale).collect()
    }

    /// `‖A v − λ v‖` for this pair.
    pub fn residual_norm(&self, matrix: &DMatrix<f64>) -> f64 {
        let dim = self.vector.len();
        let mut sum = 0.0_f64;
        for i in 0..dim {
            let mut row = Complex64::new(0.0, 0.0);
            for j in 0..dim {
                row += self.vector[j] * matrix[(i, j)];
            }
            sum += (row - self.value * self.vector[i]).norm_sqr();
        }
        sum.sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    /// Every eigenvalue has a negative real part.
    AsymptoticallyStable,
    /// At least one eigenvalue has a positive real part.
    Unstable,
    /// No positive real parts, at least one on the imaginary axis.
    Marginal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenDecomposition {
    pub pairs: Vec<EigenPair>,
}

impl EigenDecomposition {
    pub fn eigenvalues(&self) -> Vec<Complex64> {
        self.pairs.iter().map(|pair| pair.value).collect()
    }

    pub fn stability(&self) -> Stability {
        let scale = self
            .pairs
            .iter()
            .map(|pair| pair.value.norm())
            .fold(1.0_f64, f64::max);
        let tol = ZERO_TOLERANCE * scale;
        if self.pairs.iter().any(|pair| pair.value.re > tol) {
            Stability::Unstable
        } else if self.pairs.iter().all(|pair| pair.value.re < -tol) {
            Stability::AsymptoticallyStable
        } else {
            Stability::Marginal
        }
    }

    /// Eigenvalues formatted to two decimals, e.g. `[-1.00,  -2.00]` or
    /// `[0.00+1.00j,  0.00-1.00j]`.
    pub fn eigenvalue_label(&self) -> String {
        let all_real = self.pairs.iter().all(|pair| pair.value.im == 0.0);
        let parts: Vec<String> = self
            .pairs
            .iter()
            .map(|pair| {
                if all_real {
                    format!("{:.2}", pair.value.re)
                } else {
                    format!("{:.2}{:+.2}j", pair.value.re, pair.value.im)
                }
            })
            .collect();
        format!("[{}]", parts.join(",  "))
    }
}

/// Full eigendecomposition of a square matrix.
///
/// Eigenvalues come from the Schur-based dense solver; each eigenvector is a
/// right singular vector of `A − λI` with a vanishing singular value. Later
/// copies of a repeated eigenvalue take the null vector that keeps the most
/// length after orthogonalization against the earlier copies, so a full
/// eigenspace yields independent directions. A defective eigenvalue falls back
/// to its single null direction.
pub fn eigen_decompose(matrix: &DMatrix<f64>) -> Result<EigenDecomposition, LinsysError> {
    validate_square(matrix)?;
    let dim = matrix.nrows();
    let eigenvalues = matrix.complex_eigenvalues();
    let complex_matrix = matrix.map(|v| Complex64::new(v, 0.0));
    let scale = matrix.norm().max(f64::MIN_POSITIVE);

    let mut pairs: Vec<EigenPair> = Vec::with_capacity(dim);
    for idx in 0..dim {
        let lambda = eigenvalues[idx];
        let cluster_tol = CLUSTER_TOLERANCE * scale.max(lambda.norm());
        let earlier: Vec<&[Complex64]> = pairs
            .iter()
            .filter(|pair| (pair.value - lambda).norm() <= cluster_tol)
            .map(|pair| pair.vector.as_slice())
            .collect();

        let mut shifted = complex_matrix.clone();
        for i in 0..dim {
            shifted[(i, i)] -= lambda;
        }

        let svd = SVD::new(shifted, true, true);
        let v_t = svd
            .v_t
            .ok_or(LinsysError::Decomposition { index: idx })?;
        let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
        order.sort_by(|&a, &b| svd.singular_values[a].total_cmp(&svd.singular_values[b]));

        // Rows of V^H are conjugated right singular vectors.
        let right_vector = |row: usize| -> Vec<Complex64> {
            v_t.row(row).iter().map(|c| c.conj()).collect()
        };
        let mut vector = right_vector(order[0]);
        if !earlier.is_empty() {
            let null_tol = NULL_TOLERANCE * scale;
            let fresh = order
                .iter()
                .copied()
                .filter(|&row| svd.singular_values[row] <= null_tol)
                .map(|row| {
                    let mut candidate = right_vector(row);
                    orthogonalize(&mut candidate, &earlier);
                    let norm = candidate.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
                    (candidate, norm)
                })
                .max_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((candidate, norm)) = fresh {
                if norm > INDEPENDENCE_TOLERANCE {
                    vector = candidate;
                }
            }
        }
        normalize_complex_vector(&mut vector);

        pairs.push(EigenPair {
            value: lambda,
            vector,
        });
    }
    Ok(EigenDecomposition { pairs })
}

/// Removes the components of `vector` along each of the unit vectors in `basis`.
fn orthogonalize(vector: &mut [Complex64], basis: &[&[Complex64]]) {
    for unit in basis {
        let projection: Complex64 = unit
            .iter()
            .zip(vector.iter())
            .map(|(u, v)| u.conj() * v)
            .sum();
        for (v, u) in vector.iter_mut().zip(unit.iter()) {
            *v -= projection * u;
        }
    }
}

/// Phase-plane type of the origin for a 2x2 system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanarEquilibrium {
    Saddle,
    StableNode,
    UnstableNode,
    StableFocus,
    UnstableFocus,
    Center,
    /// A zero eigenvalue: a line of equilibria or a non-isolated fixed point.
    Degenerate,
}

/// Classifies the origin of `dx/dt = A x` from the trace and determinant.
pub fn classify_planar(matrix: &DMatrix<f64>) -> Result<PlanarEquilibrium, LinsysError> {
    validate_square(matrix)?;
    if matrix.nrows() != 2 {
        return Err(LinsysError::Shape {
            expected: 2,
            got: matrix.nrows(),
        });
    }
    let scale = matrix.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return Ok(PlanarEquilibrium::Degenerate);
    }
    let trace = matrix[(0, 0)] + matrix[(1, 1)];
    let det = matrix[(0, 0)] * matrix[(1, 1)] - matrix[(0, 1)] * matrix[(1, 0)];
    let discriminant = trace * trace - 4.0 * det;
    let det_tol = ZERO_TOLERANCE * scale * scale;
    let trace_tol = ZERO_TOLERANCE * scale;

    let kind = if det < -det_tol {
        PlanarEquilibrium::Saddle
    } else if det.abs() <= det_tol {
        PlanarEquilibrium::Degenerate
    } else if trace.abs() <= trace_tol {
        PlanarEquilibrium::Center
    } else if discriminant < 0.0 {
        if trace < 0.0 {
            PlanarEquilibrium::StableFocus
        } else {
            PlanarEquilibrium::UnstableFocus
        }
    } else if trace < 0.0 {
        PlanarEquilibrium::StableNode
    } else {
        PlanarEquilibrium::UnstableNode
    };
    Ok(kind)
}

fn normalize_complex_vector(vec: &mut [Complex64]) {
    let norm = vec.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
    if norm > 0.0 {
        for entry in vec {
            *entry /= norm;
        }
    }
}
