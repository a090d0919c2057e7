//! Dense row-major matrix storage, construction and element access.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::MatrixError;

/// Memory layout of a flat buffer handed to [`Matrix::from_vec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Consecutive elements walk along a row.
    RowMajor,
    /// Consecutive elements walk down a column.
    ColumnMajor,
}

/// Direction along which a vector operation is broadcast.
///
/// | Axis | Applied to | Vector length | `average` output length |
/// |------|------------|---------------|-------------------------|
/// | `Rows` | each row | `cols` | `rows` |
/// | `Columns` | each column | `rows` | `cols` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Row by row.
    Rows,
    /// Column by column.
    Columns,
}

/// Dense `f64` matrix stored in row-major order.
///
/// The shape only changes through [`insert_row`](Self::insert_row),
/// [`insert_column`](Self::insert_column) and [`clear`](Self::clear).
///
/// # Example
///
/// ```
/// use gmix_matrix::Matrix;
///
/// let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// assert_eq!(a.shape(), (2, 2));
/// assert_eq!(a[(1, 0)], 3.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates an empty 0x0 matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Creates the `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_diag(&vec![1.0; n])
    }

    /// Creates a square matrix with `diag` on the diagonal and zeros elsewhere.
    pub fn from_diag(diag: &[f64]) -> Self {
        let n = diag.len();
        let mut m = Self::zeros(n, n);
        for (i, &d) in diag.iter().enumerate() {
            m.data[i * n + i] = d;
        }
        m
    }

    /// Builds a matrix from a flat buffer in the given orientation.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::LengthMismatch`] if `data.len() != rows * cols`.
    pub fn from_vec(
        data: Vec<f64>,
        rows: usize,
        cols: usize,
        orientation: Orientation,
    ) -> Result<Self, MatrixError> {
        if data.len() != rows * cols {
            return Err(MatrixError::LengthMismatch {
                op: "from_vec",
                expected: rows * cols,
                got: data.len(),
            });
        }
        match orientation {
            Orientation::RowMajor => Ok(Self { rows, cols, data }),
            Orientation::ColumnMajor => {
                let mut m = Self::zeros(rows, cols);
                for j in 0..cols {
                    for i in 0..rows {
                        m.data[i * cols + j] = data[j * rows + i];
                    }
                }
                Ok(m)
            }
        }
    }

    /// Builds a matrix from a slice of equal-length rows.
    ///
    /// An empty slice yields a 0x0 matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::LengthMismatch`] if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MatrixError> {
        let Some(first) = rows.first() else {
            return Ok(Self::new());
        };
        let cols = first.len();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(MatrixError::LengthMismatch {
                    op: "from_rows",
                    expected: cols,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns `true` if the matrix has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if `rows == cols`.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Returns the element at `(row, col)`, or `None` if out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    /// Overwrites the element at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfBounds`] if either index is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        self.check_row(row)?;
        self.check_col(col)?;
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    /// Returns the underlying row-major buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Borrows row `i` without copying.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    pub fn row_slice(&self, i: usize) -> &[f64] {
        assert!(i < self.rows, "row index {i} out of bounds ({})", self.rows);
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterates over rows as slices.
    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| &self.data[i * self.cols..(i + 1) * self.cols])
    }

    /// Returns a copy of row `i`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfBounds`] if `i >= rows`.
    pub fn row(&self, i: usize) -> Result<Vec<f64>, MatrixError> {
        self.check_row(i)?;
        Ok(self.row_slice(i).to_vec())
    }

    /// Returns a copy of column `j`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfBounds`] if `j >= cols`.
    pub fn column(&self, j: usize) -> Result<Vec<f64>, MatrixError> {
        self.check_col(j)?;
        Ok((0..self.rows).map(|i| self.data[i * self.cols + j]).collect())
    }

    /// Inserts `row` so that it becomes row `at`, shifting later rows down.
    ///
    /// Inserting into a 0x0 matrix sets the column count to `row.len()`.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::LengthMismatch`] if `row` is empty, or its length differs
    ///   from `cols` on a non-empty matrix.
    /// - [`MatrixError::IndexOutOfBounds`] if `at > rows`.
    pub fn insert_row(&mut self, row: &[f64], at: usize) -> Result<&mut Self, MatrixError> {
        let expected = if self.is_unshaped() { row.len().max(1) } else { self.cols };
        if row.len() != expected {
            return Err(MatrixError::LengthMismatch {
                op: "insert_row",
                expected,
                got: row.len(),
            });
        }
        if at > self.rows {
            return Err(MatrixError::IndexOutOfBounds {
                axis: "row",
                index: at,
                len: self.rows,
            });
        }
        if self.is_unshaped() {
            self.cols = row.len();
        }
        let offset = at * self.cols;
        self.data.splice(offset..offset, row.iter().copied());
        self.rows += 1;
        Ok(self)
    }

    /// Inserts `col` so that it becomes column `at`, shifting later columns right.
    ///
    /// Inserting into a 0x0 matrix sets the row count to `col.len()`.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::LengthMismatch`] if `col` is empty, or its length differs
    ///   from `rows` on a non-empty matrix.
    /// - [`MatrixError::IndexOutOfBounds`] if `at > cols`.
    pub fn insert_column(&mut self, col: &[f64], at: usize) -> Result<&mut Self, MatrixError> {
        let expected = if self.is_unshaped() { col.len().max(1) } else { self.rows };
        if col.len() != expected {
            return Err(MatrixError::LengthMismatch {
                op: "insert_column",
                expected,
                got: col.len(),
            });
        }
        if at > self.cols {
            return Err(MatrixError::IndexOutOfBounds {
                axis: "column",
                index: at,
                len: self.cols,
            });
        }
        let rows = col.len();
        let new_cols = self.cols + 1;
        let mut data = Vec::with_capacity(rows * new_cols);
        for (i, &v) in col.iter().enumerate() {
            let old = &self.data[i * self.cols..(i + 1) * self.cols];
            data.extend_from_slice(&old[..at]);
            data.push(v);
            data.extend_from_slice(&old[at..]);
        }
        self.rows = rows;
        self.cols = new_cols;
        self.data = data;
        Ok(self)
    }

    /// Removes every entry, leaving a 0x0 matrix.
    pub fn clear(&mut self) {
        self.rows = 0;
        self.cols = 0;
        self.data.clear();
    }

    /// Returns `true` if the matrix is square and `|a_ij - a_ji| <= tol` everywhere.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.rows;
        (0..n).all(|i| (i + 1..n).all(|j| (self.data[i * n + j] - self.data[j * n + i]).abs() <= tol))
    }

    /// Returns `true` if every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub(crate) fn from_parts(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn is_unshaped(&self) -> bool {
        self.rows == 0 && self.cols == 0
    }

    fn check_row(&self, i: usize) -> Result<(), MatrixError> {
        if i >= self.rows {
            return Err(MatrixError::IndexOutOfBounds {
                axis: "row",
                index: i,
                len: self.rows,
            });
        }
        Ok(())
    }

    fn check_col(&self, j: usize) -> Result<(), MatrixError> {
        if j >= self.cols {
            return Err(MatrixError::IndexOutOfBounds {
                axis: "column",
                index: j,
                len: self.cols,
            });
        }
        Ok(())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows() {
            let line: Vec<String> = row.iter().map(|v| format!("{v:>12.6}")).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
