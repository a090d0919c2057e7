//! Element-wise and product arithmetic.

use crate::error::MatrixError;
use crate::matrix::{Axis, Matrix};

impl Matrix {
    /// Matrix product `self * other`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ShapeMismatch`] unless `self.cols() == other.rows()`.
    /// Neither operand is modified.
    pub fn dot(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols() != other.rows() {
            return Err(MatrixError::ShapeMismatch {
                op: "dot",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let (n, inner, m) = (self.rows(), self.cols(), other.cols());
        let a = self.as_slice();
        let b = other.as_slice();
        let mut out = vec![0.0; n * m];
        // i-k-j order walks both operands row-wise.
        for i in 0..n {
            let out_row = &mut out[i * m..(i + 1) * m];
            for k in 0..inner {
                let aik = a[i * inner + k];
                let b_row = &b[k * m..(k + 1) * m];
                for (o, &bkj) in out_row.iter_mut().zip(b_row) {
                    *o += aik * bkj;
                }
            }
        }
        Ok(Matrix::from_parts(n, m, out))
    }

    /// Returns `self + other`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ShapeMismatch`] if the shapes differ.
    pub fn add(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Returns `self - other`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ShapeMismatch`] if the shapes differ.
    pub fn subtract(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(other, "subtract", |a, b| a - b)
    }

    /// Adds `vector` to every row (`Axis::Rows`) or every column
    /// (`Axis::Columns`) in place.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::LengthMismatch`] if `vector` does not match the
    /// orthogonal dimension.
    pub fn add_vector(&mut self, vector: &[f64], axis: Axis) -> Result<(), MatrixError> {
        self.broadcast(vector, axis, "add_vector", |a, v| a + v)
    }

    /// Subtracts `vector` from every row (`Axis::Rows`) or every column
    /// (`Axis::Columns`) in place.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::LengthMismatch`] if `vector` does not match the
    /// orthogonal dimension.
    pub fn subtract_vector(&mut self, vector: &[f64], axis: Axis) -> Result<(), MatrixError> {
        self.broadcast(vector, axis, "subtract_vector", |a, v| a - v)
    }

    /// Multiplies every element by `factor` in place.
    pub fn scale(&mut self, factor: f64) {
        self.data_mut().iter_mut().for_each(|v| *v *= factor);
    }

    /// Returns the transpose.
    pub fn transpose(&self) -> Matrix {
        let (rows, cols) = self.shape();
        let src = self.as_slice();
        let mut out = vec![0.0; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                out[j * rows + i] = src[i * cols + j];
            }
        }
        Matrix::from_parts(cols, rows, out)
    }

    fn zip_with(
        &self,
        other: &Matrix,
        op: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Matrix, MatrixError> {
        if self.shape() != other.shape() {
            return Err(MatrixError::ShapeMismatch {
                op,
                left: self.shape(),
                right: other.shape(),
            });
        }
        let data = self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Matrix::from_parts(self.rows(), self.cols(), data))
    }

    fn broadcast(
        &mut self,
        vector: &[f64],
        axis: Axis,
        op: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<(), MatrixError> {
        let (rows, cols) = self.shape();
        let expected = match axis {
            Axis::Rows => cols,
            Axis::Columns => rows,
        };
        if vector.len() != expected {
            return Err(MatrixError::LengthMismatch {
                op,
                expected,
                got: vector.len(),
            });
        }
        let data = self.data_mut();
        for i in 0..rows {
            for j in 0..cols {
                let v = match axis {
                    Axis::Rows => vector[j],
                    Axis::Columns => vector[i],
                };
                data[i * cols + j] = f(data[i * cols + j], v);
            }
        }
        Ok(())
    }
}
