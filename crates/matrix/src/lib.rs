//! # gmix-matrix
//!
//! Dense `f64` matrix primitives used by the K-means and EM stages: element
//! access, row/column insertion, products, LU-based inverse and determinant,
//! Cholesky log-determinant, covariance and weighted averages.
//!
//! This is not a general-purpose linear-algebra library. Only the operations
//! the mixture-model pipeline needs are provided.
//!
//! ## Operations
//!
//! | Operation | Method | Fails with |
//! |-----------|--------|------------|
//! | product | [`Matrix::dot`] | `ShapeMismatch` |
//! | inverse | [`Matrix::inv`] | `NotSquare`, `Singular` |
//! | determinant | [`Matrix::det`], [`Matrix::slogdet`] | `NotSquare`, `NonFinite` |
//! | SPD factor | [`Matrix::cholesky`], [`Matrix::log_det`] | `NotSquare`, `NotPositiveDefinite` |
//! | covariance | [`Matrix::covar`], [`Matrix::weighted_covar`] | `InsufficientRows`, `ZeroWeight` |
//! | average | [`Matrix::average`] | `LengthMismatch`, `ZeroWeight` |
//! | insertion | [`Matrix::insert_row`], [`Matrix::insert_column`] | `LengthMismatch`, `IndexOutOfBounds` |
//!
//! Errors are split into a size class and a solver class, see
//! [`MatrixError::is_size_error`].

mod arith;
mod cholesky;
mod error;
mod lu;
mod matrix;
mod stats;

pub use error::MatrixError;
pub use matrix::{Axis, Matrix, Orientation};
