//! Unsupervised outlier detection
//!
//! Detectors implement [`OutlierDetector`]: they fit on a sample matrix,
//! score new rows (larger is more anomalous) and turn the training scores
//! into a threshold and binary labels from a contamination fraction.
//!
//! - [`McdDetector`]: squared Mahalanobis distance to a Minimum Covariance
//!   Determinant estimate
//! - [`TrainingScores`]: threshold, labels, probability and confidence
//!   conversions shared by every detector
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use robust_outlier::{McdDetector, McdParams, OutlierDetector, ProbabilityMethod, RandomState};
//!
//! let x = DMatrix::from_fn(50, 3, |i, j| ((i * (j + 2)) as f64 * 0.37).cos());
//! let params = McdParams { contamination: 0.1, random_state: RandomState::Seed(7), ..Default::default() };
//! let mut detector = McdDetector::new(params);
//! detector.fit(&x, None).unwrap();
//!
//! assert_eq!(detector.labels().unwrap().iter().filter(|&&l| l == 1).count(), 5);
//! let proba = detector.predict_proba(&x, ProbabilityMethod::Unify).unwrap();
//! assert!(proba.iter().all(|p| (p[0] + p[1] - 1.0).abs() < 1e-12));
//! ```

pub mod detector;
pub mod mcd;
pub mod threshold;

pub use detector::OutlierDetector;
pub use mcd::{McdDetector, McdDetectorBuilder, McdParams};
pub use robust_covariance::RandomState;
pub use threshold::{
    n_classes_from_targets, validate_contamination, ProbabilityMethod, TrainingScores,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        McdDetector, McdParams, OutlierDetector, ProbabilityMethod, RandomState, TrainingScores,
    };
}
