//! Integration tests for the MCD and empirical covariance estimators

mod common;

use common::*;
use nalgebra::DMatrix;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use robust_core::Error;
use robust_covariance::prelude::*;

#[test]
fn test_outliers_have_largest_distances() {
    let x = contaminated(100, 5, 3, 10.0, 42);
    let fitted = MinCovDet::new().with_random_state(42).fit(&x).unwrap();

    let dist = fitted.dist();
    let max_inlier = dist[..100].iter().copied().fold(0.0, f64::max);
    let min_outlier = dist[100..].iter().copied().fold(f64::INFINITY, f64::min);
    assert!(min_outlier > max_inlier);
    assert!(fitted.support()[100..].iter().all(|&s| !s));
    assert!(fitted.raw_support()[100..].iter().all(|&s| !s));
}

#[test]
fn test_robust_location_ignores_outliers() {
    let x = contaminated(100, 10, 2, 25.0, 7);
    let robust = MinCovDet::new().with_random_state(7).fit(&x).unwrap();
    let classical = EmpiricalCovariance::new().fit(&x).unwrap();

    for j in 0..2 {
        assert!(robust.location()[j].abs() < 0.5);
        assert!(classical.location()[j] > 1.5);
    }
}

#[test]
fn test_seed_reproducibility() {
    let x = contaminated(80, 8, 2, 8.0, 3);
    let estimator = MinCovDet::new().with_random_state(11);
    let a = estimator.fit(&x).unwrap();
    let b = estimator.fit(&x).unwrap();
    assert_eq!(a.support(), b.support());
    assert_eq!(a.dist(), b.dist());

    // A generator state is cloned per fit, so it reproduces as well
    let estimator = MinCovDet::new().with_random_state(ChaCha8Rng::seed_from_u64(5));
    let a = estimator.fit(&x).unwrap();
    let b = estimator.fit(&x).unwrap();
    assert_eq!(a.raw_support(), b.raw_support());
    assert_eq!(a.covariance(), b.covariance());
}

#[test]
fn test_large_sample_path() {
    // More than 500 samples runs FastMCD on subsets first
    let x = contaminated(570, 30, 2, 12.0, 9);
    let fitted = MinCovDet::new().with_random_state(9).fit(&x).unwrap();
    assert_eq!(fitted.raw_support().len(), 600);
    assert!(fitted.raw_support()[570..].iter().all(|&s| !s));
    let n_raw = fitted.raw_support().iter().filter(|&&s| s).count();
    // ceil((600 + 2 + 1) / 2)
    assert_eq!(n_raw, 302);
}

#[test]
fn test_full_data_refinement_path() {
    // 1500 samples or more refines the merged candidates on the full data
    let x = contaminated(1520, 80, 3, 12.0, 11);
    let fitted = MinCovDet::new().with_random_state(11).fit(&x).unwrap();
    assert_eq!(fitted.raw_support().len(), 1600);
    // ceil((1600 + 3 + 1) / 2)
    let n_raw = fitted.raw_support().iter().filter(|&&s| s).count();
    assert_eq!(n_raw, 802);
    assert!(fitted.raw_support()[1520..].iter().all(|&s| !s));
    assert!(fitted.support()[1520..].iter().all(|&s| !s));

    let dist = fitted.mahalanobis(&x).unwrap();
    for (a, b) in dist.iter().zip(fitted.dist()) {
        assert_relative_eq!(*a, *b, max_relative = 1e-8);
    }
}

#[test]
fn test_features_on_distant_scales() {
    let mut x = contaminated(95, 5, 2, 12.0, 4);
    for i in 0..x.nrows() {
        x[(i, 0)] *= 1e4;
        x[(i, 1)] *= 1e-4;
    }
    let fitted = MinCovDet::new().with_random_state(4).fit(&x).unwrap();
    // ceil((100 + 2 + 1) / 2)
    assert_eq!(fitted.raw_support().iter().filter(|&&s| s).count(), 52);
    assert!(fitted.raw_support()[95..].iter().all(|&s| !s));
    assert!(fitted.covariance()[(0, 0)] > 1e6);
    assert!(fitted.covariance()[(1, 1)] > 0.0 && fitted.covariance()[(1, 1)] < 1e-6);
}

#[test]
fn test_support_fraction_sets_raw_support_size() {
    let x = gaussian(60, 2, 1);
    let fitted = MinCovDet::new()
        .with_support_fraction(Some(0.8))
        .with_random_state(0)
        .fit(&x)
        .unwrap();
    assert_eq!(fitted.raw_support().iter().filter(|&&s| s).count(), 48);
}

#[test]
fn test_univariate_fit() {
    let x = contaminated(40, 4, 1, 20.0, 2);
    let fitted = MinCovDet::new().fit(&x).unwrap();
    assert_eq!(fitted.location().len(), 1);
    assert!(fitted.support()[40..].iter().all(|&s| !s));
}

#[test]
fn test_mahalanobis_matches_training_dist() {
    let x = gaussian(50, 3, 4);
    let fitted = MinCovDet::new().with_random_state(4).fit(&x).unwrap();
    let dist = fitted.mahalanobis(&x).unwrap();
    for (a, b) in dist.iter().zip(fitted.dist()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn test_feature_mismatch_is_invalid_input() {
    let fitted = MinCovDet::new()
        .with_random_state(0)
        .fit(&gaussian(30, 3, 0))
        .unwrap();
    let err = fitted.mahalanobis(&gaussian(5, 4, 1)).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(err.to_string().contains("4 features"));
}

#[test]
fn test_non_finite_input_rejected() {
    let mut x = gaussian(20, 2, 0);
    x[(3, 1)] = f64::NAN;
    assert!(matches!(
        MinCovDet::new().fit(&x),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_more_features_than_samples() {
    let x = gaussian(5, 8, 0);
    assert!(matches!(
        MinCovDet::new().with_random_state(0).fit(&x),
        Err(Error::EstimatorFailure(_))
    ));
}

#[test]
fn test_score_prefers_matching_data() {
    let train = gaussian(200, 2, 1);
    let fitted = MinCovDet::new().with_random_state(1).fit(&train).unwrap();
    let near = gaussian(100, 2, 2);
    let mut far = gaussian(100, 2, 3);
    far.iter_mut().for_each(|v| *v = *v * 5.0 + 3.0);
    assert!(fitted.score(&near).unwrap() > fitted.score(&far).unwrap());
}

#[test]
fn test_config_serde_round_trip() {
    let config = MinCovDet::new()
        .with_store_precision(false)
        .with_support_fraction(Some(0.75))
        .with_random_state(21);
    let json = serde_json::to_string(&config).unwrap();
    let back: MinCovDet = serde_json::from_str(&json).unwrap();
    assert!(!back.store_precision());
    assert_eq!(back.support_fraction(), Some(0.75));
    assert!(matches!(back.random_state(), RandomState::Seed(21)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_distances_finite_and_non_negative(
        seed in 0u64..1000,
        n_samples in 20usize..80,
        n_features in 1usize..4,
    ) {
        let x = gaussian(n_samples, n_features, seed);
        let fitted = MinCovDet::new().with_random_state(seed).fit(&x).unwrap();
        prop_assert!(fitted.dist().iter().all(|d| d.is_finite() && *d >= 0.0));
        prop_assert!(fitted.support().iter().any(|&s| s));

        let test = DMatrix::from_fn(7, n_features, |i, j| (i + j) as f64 - 3.0);
        let scored = fitted.mahalanobis(&test).unwrap();
        prop_assert_eq!(scored.len(), 7);
        prop_assert!(scored.iter().all(|d| d.is_finite() && *d >= 0.0));
    }
}
