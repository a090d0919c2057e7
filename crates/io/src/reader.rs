//! Delimited-text reader configuration and parsing.

use std::io::Read;
use std::path::Path;

use gmix_matrix::{Matrix, Orientation};
use tracing::{debug, info};

use crate::error::IoError;

// ---------------------------------------------------------------------------
// ReaderConfig
// ---------------------------------------------------------------------------

/// Configuration for reading a numeric table from delimited text.
///
/// Defaults: comma delimiter, no header row, every column, surrounding
/// whitespace trimmed.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Field delimiter byte.
    delimiter: u8,
    /// Whether the first record is a header and should be skipped.
    has_headers: bool,
    /// Columns to keep, in output order. `None` keeps all.
    columns: Option<Vec<usize>>,
    /// Trim whitespace around each field.
    trim: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: false,
            columns: None,
            trim: true,
        }
    }
}

impl ReaderConfig {
    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Treat the first record as a header row.
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Keep only the given 0-based columns, in the given order.
    pub fn with_columns(mut self, columns: Option<Vec<usize>>) -> Self {
        self.columns = columns;
        self
    }

    /// Enable or disable whitespace trimming.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Returns the field delimiter byte.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Returns `true` if the first record is a header.
    pub fn has_headers(&self) -> bool {
        self.has_headers
    }

    /// Returns the selected column indices, if any.
    pub fn columns(&self) -> Option<&[usize]> {
        self.columns.as_deref()
    }

    /// Validate that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every problem found: a quote
    /// or line break used as delimiter, an empty column selection, or a
    /// column selected twice.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut problems = Vec::new();
        if matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            problems.push(format!(
                "delimiter {:?} is not allowed",
                char::from(self.delimiter)
            ));
        }
        if let Some(cols) = &self.columns {
            if cols.is_empty() {
                problems.push("column selection is empty".to_string());
            }
            let mut sorted = cols.clone();
            sorted.sort_unstable();
            if sorted.windows(2).any(|w| w[0] == w[1]) {
                problems.push("column selection contains duplicates".to_string());
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: problems.len(),
                details: problems.join("; "),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// read_table
// ---------------------------------------------------------------------------

/// Read a numeric table from a delimited text file, one point per row.
///
/// # Errors
///
/// - [`IoError::Validation`] for an invalid config (checked before the file
///   is opened).
/// - [`IoError::FileNotFound`] if `path` does not exist.
/// - Any error from [`read_table_from_reader`].
pub fn read_table(path: &Path, config: &ReaderConfig) -> Result<Matrix, IoError> {
    config.validate()?;
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), "opening table");
    let file = std::fs::File::open(path).map_err(|e| IoError::Csv {
        reason: format!("{}: {e}", path.display()),
    })?;
    let table = read_table_from_reader(file, config)?;
    info!(
        path = %path.display(),
        rows = table.rows(),
        cols = table.cols(),
        "read table"
    );
    Ok(table)
}

/// Read a numeric table from any reader.
///
/// Blank lines are skipped and RFC 4180 quoting (including doubled quotes)
/// is honoured. Every record must have the same number of fields as the
/// first one.
///
/// # Errors
///
/// - [`IoError::Csv`] for I/O failures or malformed quoting.
/// - [`IoError::RaggedRow`] if a record's field count differs from the first.
/// - [`IoError::ColumnOutOfRange`] if a selected column does not exist.
/// - [`IoError::Parse`] if a cell is not a finite number.
/// - [`IoError::EmptyTable`] if there are no data rows.
pub fn read_table_from_reader<R: Read>(reader: R, config: &ReaderConfig) -> Result<Matrix, IoError> {
    config.validate()?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.has_headers)
        .flexible(true)
        .trim(if config.trim {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .from_reader(reader);

    let mut values = Vec::new();
    let mut width: Option<usize> = None;
    let mut rows = 0;
    let mut record = csv::StringRecord::new();

    while csv_reader.read_record(&mut record)? {
        let line = record.position().map_or(0, |p| p.line());
        let expected = match width {
            Some(w) => w,
            None => {
                if let Some(cols) = &config.columns {
                    if let Some(&bad) = cols.iter().find(|&&c| c >= record.len()) {
                        return Err(IoError::ColumnOutOfRange {
                            column: bad,
                            width: record.len(),
                        });
                    }
                }
                *width.insert(record.len())
            }
        };
        if record.len() != expected {
            return Err(IoError::RaggedRow {
                line,
                expected,
                got: record.len(),
            });
        }

        match &config.columns {
            Some(cols) => {
                for &c in cols {
                    values.push(parse_cell(&record[c], line, c)?);
                }
            }
            None => {
                for (c, cell) in record.iter().enumerate() {
                    values.push(parse_cell(cell, line, c)?);
                }
            }
        }
        rows += 1;
    }

    if rows == 0 {
        return Err(IoError::EmptyTable);
    }
    let cols = values.len() / rows;
    debug!(rows, cols, "parsed table");
    Ok(Matrix::from_vec(values, rows, cols, Orientation::RowMajor)?)
}

fn parse_cell(cell: &str, line: u64, column: usize) -> Result<f64, IoError> {
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(IoError::Parse {
            line,
            column,
            value: cell.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str, config: &ReaderConfig) -> Result<Matrix, IoError> {
        read_table_from_reader(text.as_bytes(), config)
    }

    #[test]
    fn default_config() {
        let cfg = ReaderConfig::default();
        assert_eq!(cfg.delimiter(), b',');
        assert!(!cfg.has_headers());
        assert!(cfg.columns().is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_collects_all_problems() {
        let err = ReaderConfig::default()
            .with_delimiter(b'"')
            .with_columns(Some(vec![1, 1]))
            .validate()
            .unwrap_err();
        match err {
            IoError::Validation { count, .. } => assert_eq!(count, 2),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn reads_simple_table() {
        let m = read("1,2\n3,4\n5,6\n", &ReaderConfig::default()).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn skips_header_and_blank_lines() {
        let cfg = ReaderConfig::default().with_headers(true);
        let m = read("x,y\n1,2\n\n3,4\n", &cfg).unwrap();
        assert_eq!(m.shape(), (2, 2));
    }

    #[test]
    fn trims_and_unquotes() {
        let m = read(" 1.5 ,\"2e3\"\n-0.25,\"7\"\n", &ReaderConfig::default()).unwrap();
        assert_eq!(m.as_slice(), &[1.5, 2000.0, -0.25, 7.0]);
    }

    #[test]
    fn other_delimiter_and_column_selection() {
        let cfg = ReaderConfig::default()
            .with_delimiter(b';')
            .with_columns(Some(vec![2, 0]));
        let m = read("1;2;3\n4;5;6\n", &cfg).unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.as_slice(), &[3.0, 1.0, 6.0, 4.0]);
    }

    #[test]
    fn ragged_row_reports_line() {
        let err = read("1,2\n3,4\n5\n", &ReaderConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            IoError::RaggedRow {
                line: 3,
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn unparsable_cell() {
        let err = read("1,2\n3,abc\n", &ReaderConfig::default()).unwrap_err();
        match err {
            IoError::Parse {
                line,
                column,
                value,
            } => {
                assert_eq!((line, column), (2, 1));
                assert_eq!(value, "abc");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_cell_rejected() {
        let err = read("1,NaN\n", &ReaderConfig::default()).unwrap_err();
        assert!(matches!(err, IoError::Parse { column: 1, .. }));
        let err = read("inf\n", &ReaderConfig::default()).unwrap_err();
        assert!(matches!(err, IoError::Parse { .. }));
    }

    #[test]
    fn column_out_of_range() {
        let cfg = ReaderConfig::default().with_columns(Some(vec![0, 3]));
        let err = read("1,2\n", &cfg).unwrap_err();
        assert!(matches!(
            err,
            IoError::ColumnOutOfRange {
                column: 3,
                width: 2
            }
        ));
    }

    #[test]
    fn empty_input() {
        let err = read("", &ReaderConfig::default()).unwrap_err();
        assert!(matches!(err, IoError::EmptyTable));
        let cfg = ReaderConfig::default().with_headers(true);
        let err = read("a,b\n", &cfg).unwrap_err();
        assert!(matches!(err, IoError::EmptyTable));
    }
}
