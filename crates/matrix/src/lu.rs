//! LU factorisation with partial pivoting: inverse, determinant and
//! signed log-determinant.
//!
//! **Not part of the public API**; exposed through [`Matrix`] methods.

use crate::error::MatrixError;
use crate::matrix::Matrix;

/// Packed `PA = LU` factorisation of a square matrix.
///
/// `lu` holds `U` on and above the diagonal and the unit-lower `L`
/// multipliers below it. `perm[i]` is the source row of row `i` of `PA`.
pub(crate) struct Lu {
    n: usize,
    lu: Vec<f64>,
    perm: Vec<usize>,
    parity: f64,
    /// Largest absolute entry of the input, for relative singularity checks.
    scale: f64,
}

impl Lu {
    /// Factorises `a`. Exactly zero pivot columns are skipped, so the
    /// factorisation always completes; singularity is judged by callers.
    pub(crate) fn factor(a: &Matrix, op: &'static str) -> Result<Self, MatrixError> {
        let (rows, cols) = a.shape();
        if rows != cols {
            return Err(MatrixError::NotSquare { op, rows, cols });
        }
        if !a.is_finite() {
            return Err(MatrixError::NonFinite { op });
        }

        let n = rows;
        let mut lu = a.as_slice().to_vec();
        let mut perm: Vec<usize> = (0..n).collect();
        let mut parity = 1.0;
        let scale = lu.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));

        for k in 0..n {
            let mut p = k;
            let mut best = lu[k * n + k].abs();
            for i in k + 1..n {
                let v = lu[i * n + k].abs();
                if v > best {
                    best = v;
                    p = i;
                }
            }
            if best == 0.0 {
                continue;
            }
            if p != k {
                for j in 0..n {
                    lu.swap(k * n + j, p * n + j);
                }
                perm.swap(k, p);
                parity = -parity;
            }
            let pivot = lu[k * n + k];
            for i in k + 1..n {
                let factor = lu[i * n + k] / pivot;
                lu[i * n + k] = factor;
                if factor != 0.0 {
                    for j in k + 1..n {
                        lu[i * n + j] -= factor * lu[k * n + j];
                    }
                }
            }
        }

        Ok(Self {
            n,
            lu,
            perm,
            parity,
            scale,
        })
    }

    fn pivot(&self, i: usize) -> f64 {
        self.lu[i * self.n + i]
    }

    /// Returns `true` if any pivot is below `n * eps * max|a_ij|`.
    pub(crate) fn is_singular(&self) -> bool {
        if self.n == 0 {
            return false;
        }
        let tol = self.n as f64 * f64::EPSILON * self.scale;
        self.scale == 0.0 || (0..self.n).any(|i| self.pivot(i).abs() <= tol)
    }

    pub(crate) fn det(&self) -> f64 {
        (0..self.n).fold(self.parity, |acc, i| acc * self.pivot(i))
    }

    /// Returns `(sign, ln|det|)`; sign is 0 and the log is `-inf` for a zero
    /// determinant.
    pub(crate) fn slogdet(&self) -> (f64, f64) {
        let mut sign = self.parity;
        let mut log_abs = 0.0;
        for i in 0..self.n {
            let p = self.pivot(i);
            if p == 0.0 {
                return (0.0, f64::NEG_INFINITY);
            }
            if p < 0.0 {
                sign = -sign;
            }
            log_abs += p.abs().ln();
        }
        (sign, log_abs)
    }

    /// Solves `A x = b` in place.
    fn solve_in_place(&self, b: &mut [f64], scratch: &mut [f64]) {
        let n = self.n;
        for (i, s) in scratch.iter_mut().enumerate() {
            *s = b[self.perm[i]];
        }
        // Forward: L y = Pb (unit diagonal)
        for i in 0..n {
            let mut acc = scratch[i];
            for j in 0..i {
                acc -= self.lu[i * n + j] * scratch[j];
            }
            scratch[i] = acc;
        }
        // Backward: U x = y
        for i in (0..n).rev() {
            let mut acc = scratch[i];
            for j in i + 1..n {
                acc -= self.lu[i * n + j] * scratch[j];
            }
            scratch[i] = acc / self.pivot(i);
        }
        b.copy_from_slice(scratch);
    }

    /// Computes `A^-1` column by column.
    pub(crate) fn inverse(&self, op: &'static str) -> Result<Matrix, MatrixError> {
        if self.is_singular() {
            return Err(MatrixError::Singular { op });
        }
        let n = self.n;
        let mut out = Matrix::zeros(n, n);
        let mut col = vec![0.0; n];
        let mut scratch = vec![0.0; n];
        for j in 0..n {
            col.iter_mut().for_each(|v| *v = 0.0);
            col[j] = 1.0;
            self.solve_in_place(&mut col, &mut scratch);
            for (i, &v) in col.iter().enumerate() {
                out[(i, j)] = v;
            }
        }
        if !out.is_finite() {
            return Err(MatrixError::Singular { op });
        }
        Ok(out)
    }
}

impl Matrix {
    /// Returns the inverse of this matrix.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::NotSquare`] if the matrix is not square.
    /// - [`MatrixError::NonFinite`] if any entry is NaN or infinite.
    /// - [`MatrixError::Singular`] if a pivot falls below `n * eps * max|a_ij|`
    ///   or the computed inverse overflows.
    ///
    /// # Example
    ///
    /// ```
    /// use gmix_matrix::Matrix;
    ///
    /// let a = Matrix::from_rows(&[vec![4.0, 7.0], vec![2.0, 6.0]]).unwrap();
    /// let inv = a.inv().unwrap();
    /// let eye = a.dot(&inv).unwrap();
    /// assert!((eye[(0, 0)] - 1.0).abs() < 1e-12);
    /// assert!(eye[(0, 1)].abs() < 1e-12);
    /// ```
    pub fn inv(&self) -> Result<Matrix, MatrixError> {
        Lu::factor(self, "inv")?.inverse("inv")
    }

    /// Returns the determinant. An exactly singular matrix yields `0.0`.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::NotSquare`] if the matrix is not square.
    /// - [`MatrixError::NonFinite`] if any entry is NaN or infinite.
    pub fn det(&self) -> Result<f64, MatrixError> {
        Ok(Lu::factor(self, "det")?.det())
    }

    /// Returns `(sign, ln|det|)` without forming the determinant, so it does
    /// not underflow for tightly concentrated covariance matrices.
    ///
    /// # Errors
    ///
    /// Same as [`det`](Self::det).
    pub fn slogdet(&self) -> Result<(f64, f64), MatrixError> {
        Ok(Lu::factor(self, "slogdet")?.slogdet())
    }
}
