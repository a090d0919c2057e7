//! Cholesky factorisation for symmetric positive-definite matrices.

use crate::error::MatrixError;
use crate::matrix::Matrix;

/// Largest `|a_ij - a_ji|` accepted as symmetric, relative to `max|a_ij|`.
const SYMMETRY_TOL: f64 = 1e-9;

impl Matrix {
    /// Returns `true` if the matrix is square and symmetric to within `1e-9`
    /// of its largest absolute entry.
    pub fn is_nearly_symmetric(&self) -> bool {
        let scale = self.as_slice().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        self.is_symmetric(SYMMETRY_TOL * scale)
    }

    /// Returns the lower-triangular `L` with `A = L Lᵀ`.
    ///
    /// Only the lower triangle of `A` is read once symmetry has been checked.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::NotSquare`] if the matrix is not square.
    /// - [`MatrixError::NonFinite`] if any entry is NaN or infinite.
    /// - [`MatrixError::NotPositiveDefinite`] if the matrix is not symmetric
    ///   or a diagonal term of the factorisation is not strictly positive.
    ///
    /// # Example
    ///
    /// ```
    /// use gmix_matrix::Matrix;
    ///
    /// let a = Matrix::from_rows(&[vec![4.0, 2.0], vec![2.0, 5.0]]).unwrap();
    /// let l = a.cholesky().unwrap();
    /// assert_eq!(l[(0, 0)], 2.0);
    /// assert_eq!(l[(1, 0)], 1.0);
    /// assert_eq!(l[(1, 1)], 2.0);
    /// assert_eq!(l[(0, 1)], 0.0);
    /// ```
    pub fn cholesky(&self) -> Result<Matrix, MatrixError> {
        let (rows, cols) = self.shape();
        if rows != cols {
            return Err(MatrixError::NotSquare {
                op: "cholesky",
                rows,
                cols,
            });
        }
        if !self.is_finite() {
            return Err(MatrixError::NonFinite { op: "cholesky" });
        }
        if !self.is_nearly_symmetric() {
            return Err(MatrixError::NotPositiveDefinite);
        }

        let n = rows;
        let mut l = Matrix::zeros(n, n);
        for j in 0..n {
            let d = self[(j, j)] - (0..j).map(|k| l[(j, k)] * l[(j, k)]).sum::<f64>();
            if !(d > 0.0 && d.is_finite()) {
                return Err(MatrixError::NotPositiveDefinite);
            }
            let ljj = d.sqrt();
            l[(j, j)] = ljj;
            for i in j + 1..n {
                let s = self[(i, j)] - (0..j).map(|k| l[(i, k)] * l[(j, k)]).sum::<f64>();
                l[(i, j)] = s / ljj;
            }
        }
        Ok(l)
    }

    /// Returns `ln(det)` of a symmetric positive-definite matrix, computed
    /// as `2 Σ ln L_ii` from the Cholesky factor.
    ///
    /// # Errors
    ///
    /// Same as [`cholesky`](Self::cholesky): indefinite matrices are rejected
    /// even when their determinant is positive.
    pub fn log_det(&self) -> Result<f64, MatrixError> {
        let l = self.cholesky()?;
        let log_det = 2.0 * (0..l.rows()).map(|i| l[(i, i)].ln()).sum::<f64>();
        if log_det.is_finite() {
            Ok(log_det)
        } else {
            Err(MatrixError::NotPositiveDefinite)
        }
    }
}
