//! Error types for gmix-io.

use std::path::PathBuf;

use gmix_matrix::MatrixError;

/// Error type for all fallible operations in the gmix-io crate.
///
/// Covers missing files, malformed delimited text, cells that are not
/// finite numbers, and configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error from the `csv` reader (I/O or malformed quoting).
    #[error("csv error: {reason}")]
    Csv {
        /// Description of the underlying failure.
        reason: String,
    },

    /// Returned when a cell is not a finite number.
    #[error("line {line}, column {column}: cannot parse '{value}' as a finite number")]
    Parse {
        /// 1-based line number in the input.
        line: u64,
        /// 0-based column index in the input record.
        column: usize,
        /// The offending cell text.
        value: String,
    },

    /// Returned when a record has a different number of fields than the first one.
    #[error("line {line}: expected {expected} fields, got {got}")]
    RaggedRow {
        /// 1-based line number in the input.
        line: u64,
        /// Field count of the first record.
        expected: usize,
        /// Field count of this record.
        got: usize,
    },

    /// Returned when a selected column does not exist.
    #[error("column {column} out of range: records have {width} fields")]
    ColumnOutOfRange {
        /// The requested column.
        column: usize,
        /// Number of fields per record.
        width: usize,
    },

    /// Returned when the input contains no data rows.
    #[error("table has no data rows")]
    EmptyTable,

    /// Returned when one or more configuration checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Wraps an error from the matrix engine.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

impl From<csv::Error> for IoError {
    fn from(e: csv::Error) -> Self {
        IoError::Csv {
            reason: e.to_string(),
        }
    }
}
