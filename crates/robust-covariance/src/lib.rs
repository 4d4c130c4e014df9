//! Robust covariance estimation
//!
//! This crate provides Gaussian location/covariance models behind the
//! [`CovarianceModel`] trait:
//!
//! - [`EmpiricalCovariance`]: the maximum-likelihood estimate
//! - [`MinCovDet`]: the Minimum Covariance Determinant estimate computed with
//!   FastMCD, consistency-corrected and re-weighted
//!
//! Both are configured by value and return an immutable fitted model from
//! `fit`, which scores new samples by squared Mahalanobis distance.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use rand::{Rng, SeedableRng};
//! use rand_chacha::ChaCha8Rng;
//! use rand_distr::StandardNormal;
//! use robust_covariance::{CovarianceModel, MinCovDet};
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(1);
//! let mut x = DMatrix::from_fn(50, 2, |_, _| rng.sample::<f64, _>(StandardNormal));
//! x[(0, 0)] = 100.0;
//! let fitted = MinCovDet::new().with_random_state(0).fit(&x).unwrap();
//! let dist = fitted.mahalanobis(&x).unwrap();
//! assert!(dist[0] > dist[1]);
//! ```
//!
//! # Features
//!
//! - `parallel`: run the FastMCD trials on the rayon thread pool. Random
//!   starts are drawn before dispatch, so seeded results do not change.

pub mod empirical;
mod fast_mcd;
pub mod linalg;
pub mod mcd;
pub mod random;
pub mod traits;

pub use empirical::{EmpiricalCovariance, FittedEmpiricalCovariance};
pub use mcd::{FittedMinCovDet, MinCovDet};
pub use random::RandomState;
pub use traits::{log_likelihood, CovarianceModel, ErrorNorm};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CovarianceModel, EmpiricalCovariance, ErrorNorm, FittedEmpiricalCovariance,
        FittedMinCovDet, MinCovDet, RandomState,
    };
}
