//! Monotonic feature construction from B-spline basis expansions.
//!
//! The crate provides a single estimator, [`MonotonicSplineTransformer`],
//! which fits a B-spline basis to the columns of a training matrix and, at
//! transform time, takes the cumulative sum of each basis column along the
//! sample axis. Because spline basis values are non-negative, every output
//! column is non-decreasing in row order, which yields features that are
//! monotonic by construction.

#![deny(dead_code)]
#![deny(unused_imports)]

pub mod basis;
pub mod data;
pub mod transformer;

pub use basis::{BasisError, KnotStrategy, SplineBasis};
pub use data::DataError;
pub use transformer::{MonotonicSplineTransformer, TransformError};
