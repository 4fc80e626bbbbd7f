use approx::assert_abs_diff_eq;
use monospline::{
    BasisError, DataError, KnotStrategy, MonotonicSplineTransformer, SplineBasis, TransformError,
};
use ndarray::{Array1, Array2, Axis, array};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};

fn ramp(n: usize) -> Array2<f64> {
    Array1::linspace(0.0, 1.0, n).insert_axis(Axis(1))
}

fn assert_columns_non_decreasing(features: &Array2<f64>) {
    for (c, column) in features.columns().into_iter().enumerate() {
        for (i, window) in column.to_vec().windows(2).enumerate() {
            assert!(
                window[0] <= window[1] + 1e-12,
                "column {} decreases between rows {} and {}: {} -> {}",
                c,
                i,
                i + 1,
                window[0],
                window[1]
            );
        }
    }
}

#[test]
fn default_fit_produces_five_finite_monotone_columns() {
    let x = ramp(100);
    let mut transformer = MonotonicSplineTransformer::default();
    let features = transformer.fit(x.view()).unwrap().transform(x.view()).unwrap();

    // n_knots + degree - 1 basis functions per input feature.
    assert_eq!(features.dim(), (100, 5));
    assert!(features.iter().all(|v| v.is_finite()));
    assert_columns_non_decreasing(&features);
}

#[test]
fn last_row_equals_column_totals_of_raw_basis() {
    let x = ramp(100);
    let mut transformer = MonotonicSplineTransformer::default();
    let features = transformer.fit(x.view()).unwrap().transform(x.view()).unwrap();

    // The cumulative sum ends at the raw basis column totals.
    let raw = SplineBasis::fit(x.view(), 3, 3, KnotStrategy::Uniform)
        .unwrap()
        .transform(x.view())
        .unwrap();
    let totals = raw.sum_axis(Axis(0));
    for (&last, &total) in features.row(99).iter().zip(totals.iter()) {
        assert_abs_diff_eq!(last, total, epsilon = 1e-9);
    }
}

#[test]
fn repeated_transform_is_deterministic() {
    let x = ramp(50);
    let mut transformer = MonotonicSplineTransformer::default();
    transformer.fit(x.view()).unwrap();

    let first = transformer.transform(x.view()).unwrap();
    let second = transformer.transform(x.view()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn transform_before_fit_is_rejected() {
    let transformer = MonotonicSplineTransformer::default();
    let err = transformer.transform(ramp(10).view()).unwrap_err();
    assert!(matches!(err, TransformError::NotFitted));
}

#[test]
fn column_count_mismatch_is_rejected() {
    let train = array![[0.0, 10.0], [0.5, 20.0], [1.0, 30.0], [1.5, 40.0]];
    let wider = array![[0.0, 10.0, 7.0], [1.0, 20.0, 8.0]];

    let mut transformer = MonotonicSplineTransformer::new(3, 1, KnotStrategy::Uniform);
    transformer.fit(train.view()).unwrap();

    let err = transformer.transform(wider.view()).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Basis(BasisError::MismatchedFeatureCount {
            found: 3,
            expected: 2,
        })
    ));
}

#[test]
fn nan_is_rejected_at_fit_and_transform() {
    let clean = ramp(20);
    let dirty = array![[0.0], [f64::NAN], [1.0]];

    let mut transformer = MonotonicSplineTransformer::default();
    let fit_err = transformer.fit(dirty.view()).unwrap_err();
    assert!(matches!(
        fit_err,
        TransformError::Data(DataError::NanFound { row: 1, col: 0 })
    ));

    transformer.fit(clean.view()).unwrap();
    let transform_err = transformer.transform(dirty.view()).unwrap_err();
    assert!(matches!(
        transform_err,
        TransformError::Data(DataError::NanFound { row: 1, col: 0 })
    ));
}

#[test]
fn infinities_pass_validation() {
    let mut x = ramp(50);
    x[[49, 0]] = f64::INFINITY;

    let mut transformer = MonotonicSplineTransformer::new(4, 3, KnotStrategy::Quantile);
    assert!(transformer.fit(x.view()).is_ok());
}

#[test]
fn multi_feature_output_is_blocked_per_input_column() {
    let n = 40;
    let first = Array1::linspace(0.0, 1.0, n);
    let second = Array1::linspace(-5.0, 5.0, n);
    let mut combined = Array2::zeros((n, 2));
    combined.column_mut(0).assign(&first);
    combined.column_mut(1).assign(&second);

    let mut transformer = MonotonicSplineTransformer::new(4, 2, KnotStrategy::Uniform);
    let features = transformer
        .fit(combined.view())
        .unwrap()
        .transform(combined.view())
        .unwrap();

    // 4 + 2 - 1 = 5 basis functions per feature, two feature blocks.
    assert_eq!(features.dim(), (n, 10));
    assert_columns_non_decreasing(&features);

    // The first block must be identical to fitting on the first column alone.
    let alone = first.clone().insert_axis(Axis(1));
    let mut single = MonotonicSplineTransformer::new(4, 2, KnotStrategy::Uniform);
    let single_features = single.fit(alone.view()).unwrap().transform(alone.view()).unwrap();
    for (&a, &b) in features
        .slice(ndarray::s![.., ..5])
        .iter()
        .zip(single_features.iter())
    {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn quantile_strategy_handles_skewed_data() {
    let mut rng = StdRng::seed_from_u64(42);
    let exponential = Exp::new(1.0).unwrap();
    let draws: Vec<f64> = (0..200).map(|_| exponential.sample(&mut rng)).collect();
    let x = Array1::from_vec(draws).insert_axis(Axis(1));

    let mut transformer = MonotonicSplineTransformer::new(5, 3, KnotStrategy::Quantile);
    let features = transformer.fit(x.view()).unwrap().transform(x.view()).unwrap();

    assert_eq!(features.dim(), (200, 7));
    assert!(features.iter().all(|v| v.is_finite()));
    assert_columns_non_decreasing(&features);
}

#[test]
fn fit_transform_matches_fit_then_transform() {
    let x = ramp(60);

    let mut chained = MonotonicSplineTransformer::default();
    let combined = chained.fit_transform(x.view()).unwrap();

    let mut staged = MonotonicSplineTransformer::default();
    staged.fit(x.view()).unwrap();
    let separate = staged.transform(x.view()).unwrap();

    assert_eq!(combined, separate);
}
