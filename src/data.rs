//! # Input Validation Module
//!
//! This module is the entry point for user-provided matrices. Both `fit` and
//! `transform` route their input through [`validate_matrix`] before any
//! numerical work happens.
//!
//! - User-Centric Errors: failures are assumed to be user-input errors, and
//!   the `DataError` enum reports the exact offending coordinate.
//! - NaN is rejected outright; infinities are tolerated and passed through to
//!   the basis-fitting step unchanged.

use ndarray::ArrayView2;
use thiserror::Error;

/// A comprehensive error type for all input validation failures.
#[derive(Error, Debug)]
pub enum DataError {
    #[error(
        "Input matrix is empty (shape [{rows}, {cols}]). At least one sample and one feature are required."
    )]
    EmptyMatrix { rows: usize, cols: usize },

    #[error(
        "NaN found at row {row}, column {col}. Remove or impute missing values before fitting or transforming."
    )]
    NanFound { row: usize, col: usize },
}

/// Validates a matrix for use by the transformer: non-empty in both
/// dimensions and free of NaN entries. Infinite values pass.
pub fn validate_matrix(x: ArrayView2<f64>) -> Result<(), DataError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(DataError::EmptyMatrix {
            rows: x.nrows(),
            cols: x.ncols(),
        });
    }

    for ((row, col), &value) in x.indexed_iter() {
        if value.is_nan() {
            return Err(DataError::NanFound { row, col });
        }
    }

    Ok(())
}
