//! Multivariate normal log-density.

use std::f64::consts::PI;

use gmix_matrix::{Matrix, MatrixError};

/// A normal distribution with its covariance inverse and log-determinant
/// precomputed, for evaluating many points against the same component.
#[derive(Debug, Clone)]
pub struct GaussianDensity {
    mean: Vec<f64>,
    precision: Matrix,
    /// `-½(M·ln 2π + ln|Σ|)`.
    log_norm: f64,
}

impl GaussianDensity {
    /// Prepares a density for `mean` and `cov`.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::NotSquare`] / [`MatrixError::LengthMismatch`] if the
    ///   shapes disagree.
    /// - [`MatrixError::Singular`] if `cov` is not invertible.
    /// - [`MatrixError::NotPositiveDefinite`] if `cov` is not symmetric
    ///   positive definite, including indefinite matrices with `|Σ| > 0`.
    pub fn new(mean: &[f64], cov: &Matrix) -> Result<Self, MatrixError> {
        let precision = cov.inv()?;
        if cov.rows() != mean.len() {
            return Err(MatrixError::LengthMismatch {
                op: "log_density",
                expected: cov.rows(),
                got: mean.len(),
            });
        }
        let log_det = cov.log_det()?;
        let m = mean.len() as f64;
        Ok(Self {
            mean: mean.to_vec(),
            precision,
            log_norm: -0.5 * (m * (2.0 * PI).ln() + log_det),
        })
    }

    /// Dimension of the distribution.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Squared Mahalanobis distance `(x−μ)ᵀ Σ⁻¹ (x−μ)`.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `x` has the distribution's dimension.
    pub fn mahalanobis_sq(&self, x: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), self.dim());
        let diff: Vec<f64> = x.iter().zip(&self.mean).map(|(a, b)| a - b).collect();
        self.precision
            .iter_rows()
            .zip(&diff)
            .map(|(row, &di)| di * row.iter().zip(&diff).map(|(p, dj)| p * dj).sum::<f64>())
            .sum()
    }

    /// Log-density at `x`.
    pub fn log_density(&self, x: &[f64]) -> f64 {
        self.log_norm - 0.5 * self.mahalanobis_sq(x)
    }
}

/// Log of the normal density `N(x | mean, cov)`:
/// `−½[M·ln(2π) + ln|Σ| + (x−μ)ᵀ Σ⁻¹ (x−μ)]`.
///
/// # Errors
///
/// See [`GaussianDensity::new`]; additionally a length error if `x` and
/// `mean` differ in length.
///
/// # Example
///
/// ```
/// use gmix_gmm::log_density;
/// use gmix_matrix::Matrix;
///
/// let ld = log_density(&[0.0], &[0.0], &Matrix::identity(1)).unwrap();
/// assert!((ld - (-0.5 * (2.0 * std::f64::consts::PI).ln())).abs() < 1e-12);
/// ```
pub fn log_density(x: &[f64], mean: &[f64], cov: &Matrix) -> Result<f64, MatrixError> {
    if x.len() != mean.len() {
        return Err(MatrixError::LengthMismatch {
            op: "log_density",
            expected: mean.len(),
            got: x.len(),
        });
    }
    Ok(GaussianDensity::new(mean, cov)?.log_density(x))
}

/// Normal density `N(x | mean, cov)`. Underflows to 0 far from the mean;
/// prefer [`log_density`] in computations.
pub fn density(x: &[f64], mean: &[f64], cov: &Matrix) -> Result<f64, MatrixError> {
    log_density(x, mean, cov).map(f64::exp)
}
