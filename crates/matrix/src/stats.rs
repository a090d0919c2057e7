//! Weighted averages and covariance estimators.

use crate::error::MatrixError;
use crate::matrix::{Axis, Matrix};

impl Matrix {
    /// Computes the (optionally weighted) mean of each row or column.
    ///
    /// - `Axis::Rows`: one value per row; `weights` has length `cols`.
    /// - `Axis::Columns`: one value per column; `weights` has length `rows`.
    ///
    /// `None` weights are treated as all ones.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::LengthMismatch`] if `weights` has the wrong length.
    /// - [`MatrixError::ZeroWeight`] if the weights sum to zero (this includes
    ///   averaging over an empty axis).
    pub fn average(&self, axis: Axis, weights: Option<&[f64]>) -> Result<Vec<f64>, MatrixError> {
        let (rows, cols) = self.shape();
        let span = match axis {
            Axis::Rows => cols,
            Axis::Columns => rows,
        };
        let uniform;
        let w = match weights {
            Some(w) => {
                if w.len() != span {
                    return Err(MatrixError::LengthMismatch {
                        op: "average",
                        expected: span,
                        got: w.len(),
                    });
                }
                w
            }
            None => {
                uniform = vec![1.0; span];
                &uniform[..]
            }
        };
        let total: f64 = w.iter().sum();
        if total == 0.0 {
            return Err(MatrixError::ZeroWeight { op: "average" });
        }

        let data = self.as_slice();
        let out = match axis {
            Axis::Rows => self
                .iter_rows()
                .map(|row| row.iter().zip(w).map(|(x, wi)| x * wi).sum::<f64>() / total)
                .collect(),
            Axis::Columns => {
                let mut acc = vec![0.0; cols];
                for (i, &wi) in w.iter().enumerate() {
                    for (a, &x) in acc.iter_mut().zip(&data[i * cols..(i + 1) * cols]) {
                        *a += wi * x;
                    }
                }
                acc.iter_mut().for_each(|a| *a /= total);
                acc
            }
        };
        Ok(out)
    }

    /// Sample covariance of the columns, treating each row as an observation
    /// (N-1 denominator, like `numpy.cov(x, rowvar=False)`).
    ///
    /// The result is `cols x cols` and exactly symmetric.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InsufficientRows`] for fewer than two rows.
    ///
    /// # Example
    ///
    /// ```
    /// use gmix_matrix::Matrix;
    ///
    /// let x = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 6.0], vec![5.0, 10.0]]).unwrap();
    /// let c = x.covar().unwrap();
    /// assert!((c[(0, 0)] - 4.0).abs() < 1e-12);
    /// assert!((c[(0, 1)] - 8.0).abs() < 1e-12);
    /// ```
    pub fn covar(&self) -> Result<Matrix, MatrixError> {
        let n = self.rows();
        if n < 2 {
            return Err(MatrixError::InsufficientRows {
                op: "covar",
                rows: n,
                min: 2,
            });
        }
        let mean = self.average(Axis::Columns, None)?;
        Ok(self.scatter(&mean, None, (n - 1) as f64))
    }

    /// Weighted maximum-likelihood covariance of the columns:
    /// `Σᵢ wᵢ (xᵢ - x̄_w)(xᵢ - x̄_w)ᵀ / Σᵢ wᵢ`, where `x̄_w` is the weighted mean.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::LengthMismatch`] if `weights.len() != rows`.
    /// - [`MatrixError::ZeroWeight`] if the weights sum to zero.
    pub fn weighted_covar(&self, weights: &[f64]) -> Result<Matrix, MatrixError> {
        let mean = self.average(Axis::Columns, Some(weights))?;
        let total: f64 = weights.iter().sum();
        Ok(self.scatter(&mean, Some(weights), total))
    }

    /// Accumulates the (weighted) scatter matrix about `center` and divides by
    /// `denom`. Only the upper triangle is accumulated, then mirrored.
    fn scatter(&self, center: &[f64], weights: Option<&[f64]>, denom: f64) -> Matrix {
        let m = self.cols();
        let mut out = Matrix::zeros(m, m);
        let mut diff = vec![0.0; m];
        for (i, row) in self.iter_rows().enumerate() {
            let w = weights.map_or(1.0, |w| w[i]);
            if w == 0.0 {
                continue;
            }
            for ((d, &x), &c) in diff.iter_mut().zip(row).zip(center) {
                *d = x - c;
            }
            for a in 0..m {
                let wa = w * diff[a];
                for b in a..m {
                    out[(a, b)] += wa * diff[b];
                }
            }
        }
        for a in 0..m {
            for b in a..m {
                let v = out[(a, b)] / denom;
                out[(a, b)] = v;
                out[(b, a)] = v;
            }
        }
        out
    }
}
