//! Error types for robust statistical analysis
//!
//! Provides a unified error type for all robust-stats crates.

use thiserror::Error;

/// Core error type for robust statistical operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to an estimator
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data (shape, finiteness, dimensionality)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Scoring or attribute access attempted before a successful fit
    #[error("This {estimator} instance is not fitted yet; call `fit` first")]
    NotFitted { estimator: String },

    /// The underlying estimator could not produce a usable fit
    #[error("Estimator failure: {0}")]
    EstimatorFailure(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for an estimator used before `fit`
    pub fn not_fitted(estimator: &str) -> Self {
        Self::NotFitted {
            estimator: estimator.to_string(),
        }
    }

    /// Create an error for a feature-count mismatch between fit and score calls
    pub fn feature_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "X has {actual} features, but {context} is expecting {expected} features as input"
        ))
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::InvalidInput(format!("{context} contains NaN or infinite values"))
    }

    /// Create an error for a covariance matrix with zero determinant
    pub fn singular_covariance() -> Self {
        Self::EstimatorFailure(
            "Singular covariance matrix. Please check that the covariance matrix \
             corresponding to the dataset is full rank and that MinCovDet is used \
             with Gaussian-distributed data (or at least data drawn from a unimodal, \
             symmetric distribution)"
                .to_string(),
        )
    }

    /// Whether this error reports use of an unfitted estimator
    pub fn is_not_fitted(&self) -> bool {
        matches!(self, Self::NotFitted { .. })
    }
}
