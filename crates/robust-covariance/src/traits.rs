//! Core trait for fitted covariance models

use crate::linalg::{empirical_covariance, fast_logdet, pinvh, squared_mahalanobis};
use nalgebra::{DMatrix, DVector};
use robust_core::validation::{check_array, check_n_features, CheckOptions};
use robust_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Matrix norm used by [`CovarianceModel::error_norm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorNorm {
    /// Sum of squared entries
    #[default]
    Frobenius,
    /// Largest singular value of `EᵀE`
    Spectral,
}

/// A fitted Gaussian location/covariance model
///
/// Implementors supply the estimates; scoring operations are shared.
pub trait CovarianceModel {
    /// Name used in error messages
    fn name(&self) -> &'static str;

    /// Estimated location, length `n_features`
    fn location(&self) -> &DVector<f64>;

    /// Estimated covariance, `n_features × n_features`
    fn covariance(&self) -> &DMatrix<f64>;

    /// Precision matrix stored at fit time, if any
    fn stored_precision(&self) -> Option<&DMatrix<f64>>;

    /// Number of features seen at fit time
    fn n_features(&self) -> usize {
        self.location().len()
    }

    /// Precision matrix, pseudo-inverting the covariance when none was stored
    fn precision(&self) -> Cow<'_, DMatrix<f64>> {
        match self.stored_precision() {
            Some(p) => Cow::Borrowed(p),
            None => Cow::Owned(pinvh(self.covariance())),
        }
    }

    /// Squared Mahalanobis distance of every row of `x` to the fitted location
    fn mahalanobis(&self, x: &DMatrix<f64>) -> Result<Vec<f64>> {
        check_array(x, &CheckOptions::for_estimator(self.name()))?;
        check_n_features(x, self.n_features(), self.name())?;
        Ok(squared_mahalanobis(x, self.location(), &self.precision()))
    }

    /// Gaussian log-likelihood of `x_test` under the fitted model
    fn score(&self, x_test: &DMatrix<f64>) -> Result<f64> {
        check_array(x_test, &CheckOptions::for_estimator(self.name()))?;
        check_n_features(x_test, self.n_features(), self.name())?;
        let location = self.location();
        let centered = DMatrix::from_fn(x_test.nrows(), x_test.ncols(), |i, j| {
            x_test[(i, j)] - location[j]
        });
        let test_covariance = empirical_covariance(&centered, true);
        Ok(log_likelihood(&test_covariance, &self.precision()))
    }

    /// Distance between `comparison` and the fitted covariance
    ///
    /// With `scaling` the squared norm is divided by `n_features`; with
    /// `squared` false its square root is returned.
    fn error_norm(
        &self,
        comparison: &DMatrix<f64>,
        norm: ErrorNorm,
        scaling: bool,
        squared: bool,
    ) -> Result<f64> {
        let covariance = self.covariance();
        if comparison.shape() != covariance.shape() {
            return Err(Error::InvalidInput(format!(
                "comparison covariance has shape {:?}, expected {:?}",
                comparison.shape(),
                covariance.shape()
            )));
        }
        let error = comparison - covariance;
        let mut squared_norm = match norm {
            ErrorNorm::Frobenius => error.iter().map(|e| e * e).sum::<f64>(),
            ErrorNorm::Spectral => (error.transpose() * &error)
                .singular_values()
                .iter()
                .fold(0.0_f64, |acc, &s| acc.max(s)),
        };
        if scaling {
            squared_norm /= error.nrows() as f64;
        }
        Ok(if squared { squared_norm } else { squared_norm.sqrt() })
    }
}

/// Gaussian log-likelihood given an empirical covariance and a precision matrix
pub fn log_likelihood(empirical: &DMatrix<f64>, precision: &DMatrix<f64>) -> f64 {
    let p = precision.nrows() as f64;
    let fit = -empirical.component_mul(precision).sum() + fast_logdet(precision);
    (fit - p * (2.0 * std::f64::consts::PI).ln()) / 2.0
}
