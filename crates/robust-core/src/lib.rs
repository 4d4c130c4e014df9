//! Core types for robust statistical analysis
//!
//! This crate provides the pieces shared by every robust-stats crate:
//!
//! - [`Error`] / [`Result`]: the unified error taxonomy
//! - [`validation`]: sample-matrix checks run at every estimator entry point
//! - [`utils`]: slice helpers (stable argsort, mean, population std, median)
//! - [`math`]: distribution functions (chi-squared, binomial, erf)
//!
//! # Example
//!
//! ```rust
//! use robust_core::validation::{check_array, matrix_from_rows, CheckOptions};
//!
//! let x = matrix_from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 2.0]]).unwrap();
//! check_array(&x, &CheckOptions::for_estimator("example").min_samples(2)).unwrap();
//! ```

pub mod error;
pub mod math;
pub mod utils;
pub mod validation;

// Re-export core types
pub use error::{Error, Result};
pub use validation::{check_array, CheckOptions};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::validation::{check_array, matrix_from_rows, CheckOptions};
    pub use crate::Result;
}
