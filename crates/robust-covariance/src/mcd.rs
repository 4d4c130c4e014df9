//! Minimum Covariance Determinant estimator
//!
//! The raw FastMCD estimate is made consistent at the normal model by
//! rescaling its distances with `median(dist) / chi2(p).median()`, then
//! re-weighted: every sample whose corrected distance falls below the 97.5%
//! chi-squared quantile joins the final support, and location and covariance
//! are recomputed on it.

use crate::fast_mcd::fast_mcd;
use crate::linalg::{column_means, empirical_covariance, gram_rank, mask_indices, pinvh, squared_mahalanobis};
use crate::random::RandomState;
use crate::traits::CovarianceModel;
use nalgebra::{DMatrix, DVector};
use robust_core::math::distributions::chi_squared;
use robust_core::utils::median;
use robust_core::validation::{check_array, CheckOptions};
use robust_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Tail probability of the chi-squared cutoff used for re-weighting
const REWEIGHT_TAIL: f64 = 0.025;

/// Minimum Covariance Determinant estimator configuration
///
/// Parameters are stored as given and checked when [`MinCovDet::fit`] runs.
///
/// # Example
///
/// ```rust
/// use nalgebra::DMatrix;
/// use robust_covariance::{CovarianceModel, MinCovDet};
///
/// let x = DMatrix::from_fn(60, 2, |i, j| ((i + 1) as f64 * (0.7 + 0.6 * j as f64)).sin());
/// let fitted = MinCovDet::new().with_random_state(42).fit(&x).unwrap();
/// assert_eq!(fitted.location().len(), 2);
/// assert_eq!(fitted.support().len(), 60);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinCovDet {
    store_precision: bool,
    assume_centered: bool,
    support_fraction: Option<f64>,
    random_state: RandomState,
}

impl Default for MinCovDet {
    fn default() -> Self {
        Self {
            store_precision: true,
            assume_centered: false,
            support_fraction: None,
            random_state: RandomState::Entropy,
        }
    }
}

impl MinCovDet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the precision matrix of the final estimate
    pub fn with_store_precision(mut self, store_precision: bool) -> Self {
        self.store_precision = store_precision;
        self
    }

    /// Compute the support as usual, then re-estimate covariance without centering
    pub fn with_assume_centered(mut self, assume_centered: bool) -> Self {
        self.assume_centered = assume_centered;
        self
    }

    /// Proportion of points in the raw support; `None` uses `(n + p + 1) / 2`
    pub fn with_support_fraction(mut self, support_fraction: Option<f64>) -> Self {
        self.support_fraction = support_fraction;
        self
    }

    /// Randomness for the subset sampling
    pub fn with_random_state(mut self, random_state: impl Into<RandomState>) -> Self {
        self.random_state = random_state.into();
        self
    }

    pub fn store_precision(&self) -> bool {
        self.store_precision
    }

    pub fn assume_centered(&self) -> bool {
        self.assume_centered
    }

    pub fn support_fraction(&self) -> Option<f64> {
        self.support_fraction
    }

    pub fn random_state(&self) -> &RandomState {
        &self.random_state
    }

    /// Fit the robust location and covariance of `x` (rows are samples)
    ///
    /// Fails with `InvalidInput` for fewer than two samples or non-finite
    /// values, `InvalidParameter` for a bad `support_fraction`, and
    /// `EstimatorFailure` when the support covariance is singular.
    #[instrument(skip(self, x), fields(n_samples = x.nrows(), n_features = x.ncols()))]
    pub fn fit(&self, x: &DMatrix<f64>) -> Result<FittedMinCovDet> {
        check_array(x, &CheckOptions::for_estimator("MinCovDet").min_samples(2))?;
        let (n_samples, n_features) = x.shape();

        let rank = gram_rank(x);
        if rank != n_features {
            warn!(rank, n_features, "the covariance matrix associated to the data is not full rank");
        }

        let mut rng = self.random_state.rng();
        let raw = fast_mcd(x, self.support_fraction, &mut rng)?;
        let raw_support = raw.support;
        let (raw_location, raw_covariance, raw_dist) = if self.assume_centered {
            let rows = mask_indices(&raw_support);
            let covariance = empirical_covariance(&x.select_rows(rows.iter()), true);
            let location = DVector::zeros(n_features);
            let dist = squared_mahalanobis(x, &location, &pinvh(&covariance));
            (location, covariance, dist)
        } else {
            (raw.location, raw.covariance, raw.dist)
        };

        let correction = consistency_correction(&raw_covariance, &raw_support, &raw_dist)?;
        debug!(correction, "consistency correction");
        let corrected: Vec<f64> = raw_dist.iter().map(|d| d / correction).collect();

        let cutoff = chi_squared::isf(n_features as f64, REWEIGHT_TAIL)?;
        let support: Vec<bool> = corrected.iter().map(|&d| d < cutoff).collect();
        let rows = mask_indices(&support);
        if rows.is_empty() {
            return Err(Error::EstimatorFailure(
                "no sample falls inside the re-weighting cutoff".to_string(),
            ));
        }
        let reweighted = x.select_rows(rows.iter());
        let location = if self.assume_centered {
            DVector::zeros(n_features)
        } else {
            column_means(&reweighted)
        };
        let covariance = empirical_covariance(&reweighted, self.assume_centered);
        let precision = pinvh(&covariance);
        let dist = squared_mahalanobis(x, &location, &precision);
        debug!(
            raw_support = raw_support.iter().filter(|&&s| s).count(),
            support = rows.len(),
            n_samples,
            "MCD fit complete"
        );

        Ok(FittedMinCovDet {
            raw_location,
            raw_covariance,
            raw_support,
            location,
            covariance,
            precision: self.store_precision.then_some(precision),
            support,
            dist,
        })
    }
}

/// Factor that makes raw distances consistent with a chi-squared(p) law
fn consistency_correction(
    raw_covariance: &DMatrix<f64>,
    raw_support: &[bool],
    raw_dist: &[f64],
) -> Result<f64> {
    let n_support = raw_support.iter().filter(|&&s| s).count();
    if n_support < raw_support.len() && raw_covariance.iter().all(|v| v.abs() <= 1e-8) {
        return Err(Error::EstimatorFailure(
            "The covariance matrix of the support data is equal to 0, try to increase support_fraction"
                .to_string(),
        ));
    }
    let correction = median(raw_dist) / chi_squared::median(raw_covariance.nrows() as f64)?;
    if !(correction.is_finite() && correction > 0.0) {
        return Err(Error::EstimatorFailure(format!(
            "invalid consistency correction factor {correction}"
        )));
    }
    Ok(correction)
}

/// Fitted MCD estimate
#[derive(Debug, Clone)]
pub struct FittedMinCovDet {
    raw_location: DVector<f64>,
    raw_covariance: DMatrix<f64>,
    raw_support: Vec<bool>,
    location: DVector<f64>,
    covariance: DMatrix<f64>,
    precision: Option<DMatrix<f64>>,
    support: Vec<bool>,
    dist: Vec<f64>,
}

impl FittedMinCovDet {
    /// Raw robust location before correction and re-weighting
    pub fn raw_location(&self) -> &DVector<f64> {
        &self.raw_location
    }

    /// Raw robust covariance before correction and re-weighting
    pub fn raw_covariance(&self) -> &DMatrix<f64> {
        &self.raw_covariance
    }

    /// Mask of the samples behind the raw estimate
    pub fn raw_support(&self) -> &[bool] {
        &self.raw_support
    }

    /// Mask of the samples behind the re-weighted estimate
    pub fn support(&self) -> &[bool] {
        &self.support
    }

    /// Squared Mahalanobis distances of the training samples
    pub fn dist(&self) -> &[f64] {
        &self.dist
    }

    pub fn n_samples(&self) -> usize {
        self.dist.len()
    }
}

impl CovarianceModel for FittedMinCovDet {
    fn name(&self) -> &'static str {
        "MinCovDet"
    }

    fn location(&self) -> &DVector<f64> {
        &self.location
    }

    fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    fn stored_precision(&self) -> Option<&DMatrix<f64>> {
        self.precision.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> DMatrix<f64> {
        // Deterministic, full-rank cloud with two gross outliers
        let mut x = DMatrix::from_fn(40, 2, |i, j| {
            let t = i as f64;
            if j == 0 {
                (t * 0.7).sin() * 2.0
            } else {
                (t * 1.3).cos() * 1.5 + 0.1 * t.sin()
            }
        });
        x[(3, 0)] = 40.0;
        x[(3, 1)] = -35.0;
        x[(17, 0)] = -30.0;
        x[(17, 1)] = 45.0;
        x
    }

    #[test]
    fn test_fit_excludes_outliers_from_support() {
        let fitted = MinCovDet::new().with_random_state(0).fit(&grid()).unwrap();
        assert!(!fitted.raw_support()[3]);
        assert!(!fitted.raw_support()[17]);
        assert!(!fitted.support()[3]);
        assert!(!fitted.support()[17]);
        let max_inlier = fitted
            .dist()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 3 && *i != 17)
            .map(|(_, &d)| d)
            .fold(0.0, f64::max);
        assert!(fitted.dist()[3] > max_inlier);
        assert!(fitted.dist()[17] > max_inlier);
    }

    #[test]
    fn test_shapes() {
        let fitted = MinCovDet::new().with_random_state(1).fit(&grid()).unwrap();
        assert_eq!(fitted.raw_location().len(), 2);
        assert_eq!(fitted.raw_covariance().shape(), (2, 2));
        assert_eq!(fitted.location().len(), 2);
        assert_eq!(fitted.covariance().shape(), (2, 2));
        assert_eq!(fitted.stored_precision().unwrap().shape(), (2, 2));
        assert_eq!(fitted.raw_support().len(), 40);
        assert_eq!(fitted.support().len(), 40);
        assert_eq!(fitted.n_samples(), 40);
    }

    #[test]
    fn test_dist_matches_mahalanobis_on_training_data() {
        let x = grid();
        let fitted = MinCovDet::new().with_random_state(2).fit(&x).unwrap();
        let scored = fitted.mahalanobis(&x).unwrap();
        for (a, b) in scored.iter().zip(fitted.dist()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_same_seed_same_estimate() {
        let x = grid();
        let a = MinCovDet::new().with_random_state(5).fit(&x).unwrap();
        let b = MinCovDet::new().with_random_state(5).fit(&x).unwrap();
        assert_eq!(a.raw_support(), b.raw_support());
        assert_eq!(a.location(), b.location());
        assert_eq!(a.covariance(), b.covariance());
    }

    #[test]
    fn test_without_stored_precision() {
        let fitted = MinCovDet::new()
            .with_store_precision(false)
            .with_random_state(0)
            .fit(&grid())
            .unwrap();
        assert!(fitted.stored_precision().is_none());
        assert!(fitted.mahalanobis(&grid()).is_ok());
    }

    #[test]
    fn test_assume_centered() {
        let fitted = MinCovDet::new()
            .with_assume_centered(true)
            .with_random_state(0)
            .fit(&grid())
            .unwrap();
        assert_eq!(fitted.raw_location(), &DVector::zeros(2));
        assert_eq!(fitted.location(), &DVector::zeros(2));
    }

    #[test]
    fn test_rejects_single_sample() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(matches!(
            MinCovDet::new().fit(&x),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_more_features_than_samples_fails() {
        let x = DMatrix::from_fn(4, 6, |i, j| (i * 6 + j) as f64 * 0.37 + ((i + j) % 3) as f64);
        assert!(matches!(
            MinCovDet::new().with_random_state(0).fit(&x),
            Err(Error::EstimatorFailure(_))
        ));
    }

    #[test]
    fn test_invalid_support_fraction() {
        let result = MinCovDet::new()
            .with_support_fraction(Some(1.5))
            .fit(&grid());
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_constant_univariate_support_fails() {
        let x = DMatrix::from_column_slice(6, 1, &[1.0, 1.0, 1.0, 1.0, 1.0, 9.0]);
        assert!(matches!(
            MinCovDet::new().fit(&x),
            Err(Error::EstimatorFailure(_))
        ));
    }
}
