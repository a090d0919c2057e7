//! # gmix-io
//!
//! Read unlabeled numeric datasets from delimited text (CSV, TSV, ...) into a
//! [`Matrix`](gmix_matrix::Matrix) with one point per row.

mod error;
mod reader;

pub use error::IoError;
pub use reader::{ReaderConfig, read_table, read_table_from_reader};
