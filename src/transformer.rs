//! The monotonic spline estimator: a B-spline basis expansion whose columns
//! are integrated (cumulatively summed) along the sample axis.

use crate::basis::{BasisError, KnotStrategy, SplineBasis};
use crate::data::{self, DataError};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by [`MonotonicSplineTransformer::fit`] and
/// [`MonotonicSplineTransformer::transform`]. Nothing is caught or retried
/// internally; every failure propagates to the caller.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Input validation failed: {0}")]
    Data(#[from] DataError),

    #[error("Spline basis error: {0}")]
    Basis(#[from] BasisError),

    #[error("This transformer has not been fitted yet. Call `fit` with training data first.")]
    NotFitted,
}

/// Produces monotonic-by-construction features from raw input.
///
/// At fit time a [`SplineBasis`] is learned from the training matrix: knot
/// placement per column, controlled by `n_knots`, `degree` and the knot
/// [`KnotStrategy`]. At transform time the basis is evaluated on the input
/// and each output column is replaced by its running prefix sum down the
/// rows. Spline basis values are non-negative, so every output column is
/// non-decreasing in the given row order (monotonic with respect to the
/// original feature's value only when the rows are sorted by that feature).
///
/// The estimator has exactly two states, unfitted and fitted; `fit` is the
/// only transition, and fitting again simply replaces the fitted state.
/// Instances are independent and hold no shared state, but a single instance
/// is not internally synchronized.
///
/// ```
/// use monospline::MonotonicSplineTransformer;
/// use ndarray::{Array1, Axis};
///
/// let x = Array1::linspace(0.0, 1.0, 100).insert_axis(Axis(1));
/// let mut transformer = MonotonicSplineTransformer::default();
/// let features = transformer.fit(x.view()).unwrap().transform(x.view()).unwrap();
/// assert_eq!(features.dim(), (100, 5));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonotonicSplineTransformer {
    n_knots: usize,
    degree: usize,
    knots: KnotStrategy,
    spline_basis: Option<SplineBasis>,
}

impl Default for MonotonicSplineTransformer {
    /// Cubic splines over 3 uniformly placed knots.
    fn default() -> Self {
        Self::new(3, 3, KnotStrategy::Uniform)
    }
}

impl MonotonicSplineTransformer {
    /// Creates an unfitted transformer. The parameters are validated by the
    /// basis module on the first `fit` call, not here.
    pub fn new(n_knots: usize, degree: usize, knots: KnotStrategy) -> Self {
        Self {
            n_knots,
            degree,
            knots,
            spline_basis: None,
        }
    }

    /// Fits the spline basis against `x` and returns `self` for chaining.
    ///
    /// `x` is read-only and never mutated. NaN entries are rejected by
    /// validation; infinities are tolerated.
    pub fn fit(&mut self, x: ArrayView2<f64>) -> Result<&mut Self, TransformError> {
        data::validate_matrix(x)?;

        // If X contains infs, they would need to be replaced by NaN markers
        // before the quantile computation; currently the quantile path sees
        // them unchanged.
        let basis = SplineBasis::fit(x, self.n_knots, self.degree, self.knots)?;
        log::debug!(
            "fitted spline basis: {} features in, {} features out",
            basis.n_features_in(),
            basis.n_features_out()
        );
        self.spline_basis = Some(basis);
        Ok(self)
    }

    /// Evaluates the fitted basis on `x` and cumulatively sums each output
    /// column along the sample axis.
    ///
    /// Errors with [`TransformError::NotFitted`] when called before `fit`,
    /// and with a basis error when the column count of `x` differs from the
    /// fit-time column count. Deterministic given the fitted state and `x`.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, TransformError> {
        let basis = self.spline_basis.as_ref().ok_or(TransformError::NotFitted)?;
        data::validate_matrix(x)?;

        let mut features = basis.transform(x)?;
        features.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);
        Ok(features)
    }

    /// Convenience composition of [`fit`](Self::fit) and
    /// [`transform`](Self::transform) on the same data.
    pub fn fit_transform(&mut self, x: ArrayView2<f64>) -> Result<Array2<f64>, TransformError> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Whether `fit` has completed on this instance.
    pub fn is_fitted(&self) -> bool {
        self.spline_basis.is_some()
    }

    /// The fitted basis, if any.
    pub fn basis(&self) -> Option<&SplineBasis> {
        self.spline_basis.as_ref()
    }

    /// Output column count, fixed once `fit` completes.
    pub fn n_features_out(&self) -> Option<usize> {
        self.spline_basis.as_ref().map(SplineBasis::n_features_out)
    }
}
