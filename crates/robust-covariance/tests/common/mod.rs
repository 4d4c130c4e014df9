//! Shared data generators for the covariance integration tests

use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

pub use approx::assert_relative_eq;

/// Standard normal samples, seeded
pub fn gaussian(n_samples: usize, n_features: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    DMatrix::from_fn(n_samples, n_features, |_, _| rng.sample::<f64, _>(StandardNormal))
}

/// Standard normal inliers followed by `n_outliers` rows shifted by `shift`
pub fn contaminated(
    n_inliers: usize,
    n_outliers: usize,
    n_features: usize,
    shift: f64,
    seed: u64,
) -> DMatrix<f64> {
    let mut x = gaussian(n_inliers + n_outliers, n_features, seed);
    for i in n_inliers..n_inliers + n_outliers {
        for j in 0..n_features {
            x[(i, j)] += shift;
        }
    }
    x
}
