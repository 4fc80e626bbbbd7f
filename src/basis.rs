use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Defines the strategy for placing the interior knots of the spline basis.
/// This is part of the public API and is saved with the fitted transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnotStrategy {
    /// Space interior knots evenly across the training value range.
    /// Deterministic given the range alone.
    Uniform,
    /// Place interior knots at quantiles of the training data, adapting
    /// knot density to the data's distribution.
    Quantile,
}

/// A comprehensive error type for all operations within the basis module.
#[derive(Error, Debug)]
pub enum BasisError {
    #[error("At least 2 knots are required to bracket the value range, but n_knots was {0}.")]
    InvalidKnotCount(usize),

    #[error("Value range is invalid: start ({0}) must be less than or equal to end ({1}).")]
    InvalidRange(f64, f64),

    #[error("Cannot compute {num_quantiles} quantile knots from only {num_points} data points.")]
    InsufficientDataForQuantiles {
        num_quantiles: usize,
        num_points: usize,
    },

    #[error("Input has {found} feature columns, but the basis was fitted on {expected}.")]
    MismatchedFeatureCount { found: usize, expected: usize },
}

/// A fitted B-spline basis expansion over the columns of a training matrix.
///
/// One full knot vector is learned per input feature at fit time. The knot
/// vectors are immutable afterwards; evaluating the basis on new data reuses
/// them unchanged, so predictions are reproducible across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplineBasis {
    degree: usize,
    knot_vectors: Vec<Array1<f64>>,
}

impl SplineBasis {
    /// Learns the knot geometry for every column of `x`.
    ///
    /// `n_knots` counts the base knots per feature, boundaries included, so
    /// `n_knots - 2` interior knots are placed inside the column's value
    /// range. Each boundary knot is repeated `degree + 1` times, giving
    /// `n_knots + degree - 1` basis functions per feature.
    ///
    /// Infinities in `x` are passed through unchanged: they stretch the
    /// value range under the `Uniform` strategy and sort to the extremes
    /// under `Quantile`.
    pub fn fit(
        x: ArrayView2<f64>,
        n_knots: usize,
        degree: usize,
        strategy: KnotStrategy,
    ) -> Result<Self, BasisError> {
        if n_knots < 2 {
            return Err(BasisError::InvalidKnotCount(n_knots));
        }
        let num_interior = n_knots - 2;

        let mut knot_vectors = Vec::with_capacity(x.ncols());
        for column in x.columns() {
            let range = internal::value_range(column);
            if range.0 > range.1 {
                return Err(BasisError::InvalidRange(range.0, range.1));
            }
            let quantile_source = match strategy {
                KnotStrategy::Quantile => Some(column),
                KnotStrategy::Uniform => None,
            };
            knot_vectors.push(internal::build_knot_vector(
                range,
                num_interior,
                degree,
                quantile_source,
            )?);
        }

        Ok(SplineBasis {
            degree,
            knot_vectors,
        })
    }

    /// Evaluates the fitted basis on `x`, one block of
    /// [`functions_per_feature`](Self::functions_per_feature) columns per
    /// input feature, in input-column order.
    ///
    /// Values outside the fit-time range are clamped to the nearest
    /// boundary before evaluation (constant extrapolation), which keeps
    /// every basis value non-negative.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, BasisError> {
        if x.ncols() != self.knot_vectors.len() {
            return Err(BasisError::MismatchedFeatureCount {
                found: x.ncols(),
                expected: self.knot_vectors.len(),
            });
        }

        let per_feature = self.functions_per_feature();
        let mut expanded = Array2::zeros((x.nrows(), x.ncols() * per_feature));
        for (feature, (column, knots)) in x.columns().into_iter().zip(&self.knot_vectors).enumerate()
        {
            let block = feature * per_feature;
            for (row, &value) in column.iter().enumerate() {
                internal::evaluate_basis_row(
                    value,
                    self.degree,
                    knots.view(),
                    expanded.slice_mut(s![row, block..block + per_feature]),
                );
            }
        }

        Ok(expanded)
    }

    /// Number of input features the basis was fitted on.
    pub fn n_features_in(&self) -> usize {
        self.knot_vectors.len()
    }

    /// Number of basis functions generated per input feature.
    pub fn functions_per_feature(&self) -> usize {
        self.knot_vectors
            .first()
            .map_or(0, |knots| knots.len() - self.degree - 1)
    }

    /// Total number of output columns produced by [`transform`](Self::transform).
    pub fn n_features_out(&self) -> usize {
        self.n_features_in() * self.functions_per_feature()
    }
}

/// Internal module for implementation details not exposed in the public API.
mod internal {
    use super::*;
    use ndarray::{Array, ArrayViewMut1, Axis, concatenate};

    /// Minimum and maximum of a column. NaN-free input is a precondition;
    /// infinities propagate into the range.
    pub(super) fn value_range(column: ArrayView1<f64>) -> (f64, f64) {
        column.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    }

    /// Builds the full knot vector for one feature: `degree + 1` repeated
    /// knots at each boundary with `num_interior` knots in between, placed
    /// uniformly or at training-data quantiles.
    pub(super) fn build_knot_vector(
        range: (f64, f64),
        num_interior: usize,
        degree: usize,
        quantile_source: Option<ArrayView1<f64>>,
    ) -> Result<Array1<f64>, BasisError> {
        let (lo, hi) = range;

        let interior = if let Some(column) = quantile_source {
            if column.len() < num_interior {
                return Err(BasisError::InsufficientDataForQuantiles {
                    num_quantiles: num_interior,
                    num_points: column.len(),
                });
            }
            quantiles(column, num_interior)
        } else if num_interior == 0 {
            Array1::from_vec(vec![])
        } else {
            let step = (hi - lo) / (num_interior as f64 + 1.0);
            Array::from_iter((1..=num_interior).map(|i| lo + i as f64 * step))
        };

        let lower = Array1::from_elem(degree + 1, lo);
        let upper = Array1::from_elem(degree + 1, hi);
        Ok(concatenate(Axis(0), &[lower.view(), interior.view(), upper.view()])
            .expect("knot vector segments share the single concatenation axis"))
    }

    /// Interior quantiles of a data vector at probabilities `k / (count + 1)`,
    /// using linear interpolation between order statistics (type 7 in R).
    fn quantiles(data: ArrayView1<f64>, count: usize) -> Array1<f64> {
        if count == 0 {
            return Array1::from_vec(vec![]);
        }

        let mut sorted = data.to_vec();
        sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len();
        Array1::from_iter((1..=count).map(|k| {
            let p = k as f64 / (count as f64 + 1.0);
            let pos = (n as f64 - 1.0) * p;
            let below = pos.floor() as usize;
            let above = pos.ceil() as usize;
            if below == above {
                sorted[below]
            } else {
                let frac = pos - below as f64;
                sorted[below] * (1.0 - frac) + sorted[above] * frac
            }
        }))
    }

    /// Evaluates all basis functions at one point and writes them into `out`.
    ///
    /// Uses the triangular Cox-de Boor recurrence: after iteration `d`,
    /// `coef[r]` holds the value of basis function `span - d + r` of degree
    /// `d`. Only the `degree + 1` functions supported on the containing knot
    /// span are non-zero; the rest of `out` is zeroed.
    pub(super) fn evaluate_basis_row(
        value: f64,
        degree: usize,
        knots: ArrayView1<f64>,
        mut out: ArrayViewMut1<f64>,
    ) {
        let num_knots = knots.len();
        let num_basis = num_knots - degree - 1;

        // Constant extrapolation: out-of-range values take the basis values
        // at the nearest boundary.
        let x = value.clamp(knots[0], knots[num_knots - 1]);

        // Knot span with knots[span] <= x < knots[span + 1], clamped so the
        // right boundary lands in the last non-empty interval.
        let span = knots
            .iter()
            .rposition(|&k| k <= x)
            .map_or(degree, |pos| pos.clamp(degree, num_basis - 1));

        let mut coef = vec![0.0; degree + 1];
        let mut left = vec![0.0; degree + 1];
        let mut right = vec![0.0; degree + 1];
        coef[0] = 1.0;
        for d in 1..=degree {
            left[d] = x - knots[span + 1 - d];
            right[d] = knots[span + d] - x;
            let mut saved = 0.0;
            for r in 0..d {
                let denom = right[r + 1] + left[d - r];
                let ratio = if denom.abs() > 1e-12 {
                    coef[r] / denom
                } else {
                    0.0
                };
                coef[r] = saved + right[r + 1] * ratio;
                saved = left[d - r] * ratio;
            }
            coef[d] = saved;
        }

        out.fill(0.0);
        let start = span - degree;
        for (r, &c) in coef.iter().enumerate() {
            out[start + r] = c;
        }
    }

    #[cfg(test)]
    pub(super) fn evaluate_basis_point(
        value: f64,
        degree: usize,
        knots: ArrayView1<f64>,
    ) -> Array1<f64> {
        let mut row = Array1::zeros(knots.len() - degree - 1);
        evaluate_basis_row(value, degree, knots, row.view_mut());
        row
    }
}
