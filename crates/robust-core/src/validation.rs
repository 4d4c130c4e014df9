//! Input validation for sample matrices
//!
//! Every estimator entry point runs its `(n_samples, n_features)` input
//! through [`check_array`] before touching the numbers.

use crate::{Error, Result};
use nalgebra::DMatrix;

/// Options controlling [`check_array`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOptions<'a> {
    /// Minimum number of rows
    pub ensure_min_samples: usize,
    /// Minimum number of columns
    pub ensure_min_features: usize,
    /// Accept NaN and infinite entries
    pub allow_non_finite: bool,
    /// Estimator name used in error messages
    pub estimator: Option<&'a str>,
}

impl Default for CheckOptions<'_> {
    fn default() -> Self {
        Self {
            ensure_min_samples: 1,
            ensure_min_features: 1,
            allow_non_finite: false,
            estimator: None,
        }
    }
}

impl<'a> CheckOptions<'a> {
    /// Options with the given estimator name and default limits
    pub fn for_estimator(estimator: &'a str) -> Self {
        Self {
            estimator: Some(estimator),
            ..Self::default()
        }
    }

    /// Require at least `n` samples
    pub fn min_samples(mut self, n: usize) -> Self {
        self.ensure_min_samples = n;
        self
    }

    fn suffix(&self) -> String {
        self.estimator
            .map(|name| format!(" by {name}"))
            .unwrap_or_default()
    }
}

/// Validate a sample matrix of shape `(n_samples, n_features)`
pub fn check_array(x: &DMatrix<f64>, options: &CheckOptions<'_>) -> Result<()> {
    let (n_samples, n_features) = x.shape();
    if n_samples < options.ensure_min_samples {
        return Err(Error::InvalidInput(format!(
            "Found array with {n_samples} sample(s) (shape=({n_samples}, {n_features})) \
             while a minimum of {} is required{}",
            options.ensure_min_samples,
            options.suffix()
        )));
    }
    if n_features < options.ensure_min_features {
        return Err(Error::InvalidInput(format!(
            "Found array with {n_features} feature(s) (shape=({n_samples}, {n_features})) \
             while a minimum of {} is required{}",
            options.ensure_min_features,
            options.suffix()
        )));
    }
    if !options.allow_non_finite && x.iter().any(|v| !v.is_finite()) {
        return Err(Error::non_finite("Input X"));
    }
    Ok(())
}

/// Check that `x` has the feature count seen at fit time
pub fn check_n_features(x: &DMatrix<f64>, expected: usize, estimator: &str) -> Result<()> {
    if x.ncols() != expected {
        return Err(Error::feature_mismatch(expected, x.ncols(), estimator));
    }
    Ok(())
}

/// Check that an optional per-sample vector matches the number of samples
pub fn check_consistent_length<T>(n_samples: usize, values: &[T], context: &str) -> Result<()> {
    if values.len() != n_samples {
        return Err(Error::size_mismatch(n_samples, values.len(), context));
    }
    Ok(())
}

/// Build a sample matrix from row slices
///
/// Rows of unequal length are rejected as a malformed shape.
///
/// # Examples
///
/// ```rust
/// use robust_core::validation::matrix_from_rows;
///
/// let x = matrix_from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
/// assert_eq!(x.shape(), (3, 2));
/// assert_eq!(x[(2, 1)], 6.0);
///
/// assert!(matrix_from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
/// ```
pub fn matrix_from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<DMatrix<f64>> {
    let n_features = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
    if let Some((i, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, r)| r.as_ref().len() != n_features)
    {
        return Err(Error::InvalidInput(format!(
            "Inhomogeneous rows: row {i} has {} values, row 0 has {n_features}",
            row.as_ref().len()
        )));
    }
    let data: Vec<f64> = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
    Ok(DMatrix::from_row_slice(rows.len(), n_features, &data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_array_accepts_finite() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(check_array(&x, &CheckOptions::default()).is_ok());
    }

    #[test]
    fn test_check_array_rejects_empty() {
        let x = DMatrix::<f64>::zeros(0, 3);
        let err = check_array(&x, &CheckOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let x = DMatrix::<f64>::zeros(3, 0);
        assert!(check_array(&x, &CheckOptions::default()).is_err());
    }

    #[test]
    fn test_check_array_min_samples() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let opts = CheckOptions::for_estimator("MinCovDet").min_samples(2);
        let err = check_array(&x, &opts).unwrap_err();
        assert!(err.to_string().contains("minimum of 2"));
        assert!(err.to_string().contains("MinCovDet"));
    }

    #[test]
    fn test_check_array_rejects_zero_features() {
        let x = DMatrix::<f64>::zeros(4, 0);
        let err = check_array(&x, &CheckOptions::for_estimator("MinCovDet")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("0 feature(s)"));
    }

    #[test]
    fn test_check_array_non_finite() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 3.0, 4.0]);
        assert!(check_array(&x, &CheckOptions::default()).is_err());
        let opts = CheckOptions {
            allow_non_finite: true,
            ..CheckOptions::default()
        };
        assert!(check_array(&x, &opts).is_ok());

        let x = DMatrix::from_row_slice(2, 2, &[1.0, f64::INFINITY, 3.0, 4.0]);
        assert!(check_array(&x, &CheckOptions::default()).is_err());
    }

    #[test]
    fn test_check_n_features() {
        let x = DMatrix::<f64>::zeros(5, 4);
        assert!(check_n_features(&x, 4, "MCD").is_ok());
        let err = check_n_features(&x, 3, "MCD").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_check_consistent_length() {
        assert!(check_consistent_length(3, &[0, 1, 0], "y").is_ok());
        assert!(check_consistent_length(3, &[0, 1], "y").is_err());
    }

    #[test]
    fn test_matrix_from_rows_empty() {
        let rows: Vec<Vec<f64>> = vec![];
        let x = matrix_from_rows(&rows).unwrap();
        assert_eq!(x.shape(), (0, 0));
    }
}
