//! Robust outlier detection built on the Minimum Covariance Determinant
//!
//! This crate re-exports the workspace crates:
//!
//! - [`robust_core`]: error taxonomy, input validation, numeric helpers
//! - [`robust_covariance`]: empirical and MCD covariance estimators
//! - [`robust_outlier`]: contamination thresholds and the MCD outlier detector
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use robust_mcd::prelude::*;
//!
//! let mut x = DMatrix::from_fn(60, 2, |i, j| ((i + 3) as f64 * (1.1 + 0.5 * j as f64)).sin());
//! x[(10, 0)] = 30.0;
//! x[(20, 1)] = -30.0;
//! x[(30, 0)] = -30.0;
//!
//! let mut detector = McdDetector::builder()
//!     .contamination(0.05)
//!     .random_state(0)
//!     .build();
//! detector.fit(&x, None)?;
//!
//! let labels = detector.labels()?;
//! assert_eq!((labels[10], labels[20], labels[30]), (1, 1, 1));
//! # Ok::<(), robust_mcd::Error>(())
//! ```
//!
//! # Features
//!
//! - `parallel`: run the FastMCD trials in parallel with rayon

pub use robust_core;
pub use robust_covariance;
pub use robust_outlier;

pub use robust_core::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use robust_core::prelude::*;
    pub use robust_covariance::prelude::*;
    pub use robust_outlier::prelude::*;
}
