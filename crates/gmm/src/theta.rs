//! Mixture parameters.

use gmix_matrix::Matrix;

use crate::error::GmmError;

/// Tolerance on `Σ weights = 1` accepted by [`Theta::new`].
const WEIGHT_SUM_TOL: f64 = 1e-6;

/// Parameters of a K-component Gaussian mixture in M dimensions.
///
/// A `Theta` is never mutated; each M-step builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Theta {
    /// Mixture weights, length K, non-negative, summing to 1.
    weights: Vec<f64>,
    /// Component means, K×M.
    means: Matrix,
    /// Component covariances, K matrices of M×M.
    covariances: Vec<Matrix>,
}

impl Theta {
    /// Builds a validated parameter set.
    ///
    /// # Errors
    ///
    /// - [`GmmError::InvalidK`] if there are no components.
    /// - [`GmmError::DimensionMismatch`] if weights, means and covariances
    ///   disagree on K or M.
    /// - [`GmmError::InvalidTheta`] if a weight is negative or non-finite,
    ///   the weights do not sum to 1, any mean/covariance entry is not finite,
    ///   or a covariance is not symmetric positive definite.
    pub fn new(weights: Vec<f64>, means: Matrix, covariances: Vec<Matrix>) -> Result<Self, GmmError> {
        let k = weights.len();
        if k == 0 {
            return Err(GmmError::InvalidK { k });
        }
        if means.rows() != k {
            return Err(GmmError::DimensionMismatch {
                what: "mean rows",
                expected: k,
                got: means.rows(),
            });
        }
        if covariances.len() != k {
            return Err(GmmError::DimensionMismatch {
                what: "covariance count",
                expected: k,
                got: covariances.len(),
            });
        }
        let m = means.cols();
        if let Some(bad) = covariances.iter().find(|c| c.shape() != (m, m)) {
            return Err(GmmError::DimensionMismatch {
                what: "covariance size",
                expected: m,
                got: bad.rows().max(bad.cols()),
            });
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(GmmError::InvalidTheta {
                reason: "weights must be finite and non-negative".to_string(),
            });
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(GmmError::InvalidTheta {
                reason: format!("weights sum to {sum}, expected 1"),
            });
        }
        if !means.is_finite() || covariances.iter().any(|c| !c.is_finite()) {
            return Err(GmmError::InvalidTheta {
                reason: "means and covariances must be finite".to_string(),
            });
        }
        for (c, cov) in covariances.iter().enumerate() {
            if !cov.is_nearly_symmetric() {
                return Err(GmmError::InvalidTheta {
                    reason: format!("covariance {c} is not symmetric"),
                });
            }
            if cov.cholesky().is_err() {
                return Err(GmmError::InvalidTheta {
                    reason: format!("covariance {c} is not positive definite"),
                });
            }
        }
        Ok(Self::from_parts(weights, means, covariances))
    }

    /// Assembles parameters already known to be consistent.
    pub(crate) fn from_parts(weights: Vec<f64>, means: Matrix, covariances: Vec<Matrix>) -> Self {
        debug_assert_eq!(weights.len(), means.rows());
        debug_assert_eq!(weights.len(), covariances.len());
        Self {
            weights,
            means,
            covariances,
        }
    }

    /// Number of components K.
    pub fn n_components(&self) -> usize {
        self.weights.len()
    }

    /// Dimension M.
    pub fn n_dims(&self) -> usize {
        self.means.cols()
    }

    /// Mixture weights, one per component.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Component means as a K×M matrix.
    pub fn means(&self) -> &Matrix {
        &self.means
    }

    /// Mean of component `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= n_components()`.
    pub fn mean(&self, k: usize) -> &[f64] {
        self.means.row_slice(k)
    }

    /// All component covariances.
    pub fn covariances(&self) -> &[Matrix] {
        &self.covariances
    }

    /// Covariance of component `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= n_components()`.
    pub fn covariance(&self, k: usize) -> &Matrix {
        &self.covariances[k]
    }
}
