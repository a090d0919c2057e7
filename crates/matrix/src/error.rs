//! Error types for the gmix-matrix crate.

/// Error type for all fallible operations in the gmix-matrix crate.
///
/// Variants fall into two classes: shape problems that are the caller's
/// fault ([`is_size_error`](Self::is_size_error)) and numeric failures of the
/// factorisation routines ([`is_solver_error`](Self::is_solver_error)).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    /// Returned when two matrix operands have incompatible shapes.
    #[error("size mismatch in {op}: left is {}x{}, right is {}x{}", left.0, left.1, right.0, right.1)]
    ShapeMismatch {
        /// Name of the operation.
        op: &'static str,
        /// Shape of the left operand.
        left: (usize, usize),
        /// Shape of the right operand.
        right: (usize, usize),
    },

    /// Returned when a vector operand has the wrong length.
    #[error("length mismatch in {op}: expected {expected}, got {got}")]
    LengthMismatch {
        /// Name of the operation.
        op: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when an operation requires a square matrix.
    #[error("{op} requires a square matrix, got {rows}x{cols}")]
    NotSquare {
        /// Name of the operation.
        op: &'static str,
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Returned when a row or column index is out of range.
    #[error("{axis} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        /// `"row"` or `"column"`.
        axis: &'static str,
        /// The offending index.
        index: usize,
        /// Number of rows or columns available.
        len: usize,
    },

    /// Returned when an operation needs more rows than the matrix has.
    #[error("{op} requires at least {min} rows, got {rows}")]
    InsufficientRows {
        /// Name of the operation.
        op: &'static str,
        /// Number of rows present.
        rows: usize,
        /// Minimum number of rows required.
        min: usize,
    },

    /// Returned when a matrix is singular to working precision.
    #[error("matrix is singular in {op}")]
    Singular {
        /// Name of the operation.
        op: &'static str,
    },

    /// Returned when a Cholesky factor or log-determinant is requested for a
    /// matrix that is not symmetric positive definite.
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,

    /// Returned when an operand contains NaN or infinity.
    #[error("non-finite value in {op}")]
    NonFinite {
        /// Name of the operation.
        op: &'static str,
    },

    /// Returned when averaging weights sum to zero.
    #[error("weights sum to zero in {op}")]
    ZeroWeight {
        /// Name of the operation.
        op: &'static str,
    },
}

impl MatrixError {
    /// Returns `true` for shape and bounds errors.
    pub fn is_size_error(&self) -> bool {
        matches!(
            self,
            Self::ShapeMismatch { .. }
                | Self::LengthMismatch { .. }
                | Self::NotSquare { .. }
                | Self::IndexOutOfBounds { .. }
                | Self::InsufficientRows { .. }
        )
    }

    /// Returns `true` for numeric failures (singular, non-PD, non-finite).
    pub fn is_solver_error(&self) -> bool {
        !self.is_size_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_shape_mismatch() {
        let e = MatrixError::ShapeMismatch {
            op: "dot",
            left: (3, 2),
            right: (3, 4),
        };
        assert_eq!(e.to_string(), "size mismatch in dot: left is 3x2, right is 3x4");
        assert!(e.is_size_error());
        assert!(!e.is_solver_error());
    }

    #[test]
    fn error_length_mismatch() {
        let e = MatrixError::LengthMismatch {
            op: "insert_row",
            expected: 3,
            got: 2,
        };
        assert_eq!(e.to_string(), "length mismatch in insert_row: expected 3, got 2");
    }

    #[test]
    fn error_not_square() {
        let e = MatrixError::NotSquare {
            op: "inv",
            rows: 2,
            cols: 3,
        };
        assert_eq!(e.to_string(), "inv requires a square matrix, got 2x3");
        assert!(e.is_size_error());
    }

    #[test]
    fn error_index_out_of_bounds() {
        let e = MatrixError::IndexOutOfBounds {
            axis: "row",
            index: 5,
            len: 2,
        };
        assert_eq!(e.to_string(), "row index 5 out of bounds (len 2)");
    }

    #[test]
    fn error_insufficient_rows() {
        let e = MatrixError::InsufficientRows {
            op: "covar",
            rows: 1,
            min: 2,
        };
        assert_eq!(e.to_string(), "covar requires at least 2 rows, got 1");
        assert!(e.is_size_error());
    }

    #[test]
    fn error_singular() {
        let e = MatrixError::Singular { op: "inv" };
        assert_eq!(e.to_string(), "matrix is singular in inv");
        assert!(e.is_solver_error());
    }

    #[test]
    fn error_solver_class() {
        assert!(MatrixError::NotPositiveDefinite.is_solver_error());
        assert!(MatrixError::NonFinite { op: "det" }.is_solver_error());
        assert!(MatrixError::ZeroWeight { op: "average" }.is_solver_error());
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<MatrixError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<MatrixError>();
    }
}
