//! Outlier detection with the Minimum Covariance Determinant
//!
//! Samples are scored by their squared Mahalanobis distance to a robust
//! location and covariance estimate, so a contaminated training set does not
//! mask its own outliers.

use crate::detector::OutlierDetector;
use crate::threshold::{n_classes_from_targets, validate_contamination, TrainingScores};
use nalgebra::{DMatrix, DVector};
use robust_core::validation::{check_array, CheckOptions};
use robust_core::{Error, Result};
use robust_covariance::{CovarianceModel, FittedMinCovDet, MinCovDet, RandomState};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const NAME: &str = "McdDetector";

/// Configuration of an [`McdDetector`]
///
/// Values are stored as given and validated when the detector is fitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McdParams {
    /// Expected fraction of outliers, in `(0, 0.5]`
    pub contamination: f64,
    /// Keep the precision matrix of the fitted estimate
    pub store_precision: bool,
    /// Estimate the covariance without centering the data
    pub assume_centered: bool,
    /// Proportion of samples in the raw MCD support; `None` uses `(n + p + 1) / 2`
    pub support_fraction: Option<f64>,
    /// Randomness for the FastMCD subset sampling
    pub random_state: RandomState,
}

impl Default for McdParams {
    fn default() -> Self {
        Self {
            contamination: 0.1,
            store_precision: true,
            assume_centered: false,
            support_fraction: None,
            random_state: RandomState::Entropy,
        }
    }
}

impl From<&McdParams> for MinCovDet {
    fn from(params: &McdParams) -> Self {
        MinCovDet::new()
            .with_store_precision(params.store_precision)
            .with_assume_centered(params.assume_centered)
            .with_support_fraction(params.support_fraction)
            .with_random_state(params.random_state.clone())
    }
}

/// Builder for [`McdDetector`]
#[derive(Debug, Clone, Default)]
pub struct McdDetectorBuilder {
    params: McdParams,
}

impl McdDetectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expected fraction of outliers
    pub fn contamination(mut self, contamination: f64) -> Self {
        self.params.contamination = contamination;
        self
    }

    pub fn store_precision(mut self, store_precision: bool) -> Self {
        self.params.store_precision = store_precision;
        self
    }

    pub fn assume_centered(mut self, assume_centered: bool) -> Self {
        self.params.assume_centered = assume_centered;
        self
    }

    /// Sets the proportion of samples in the raw MCD support
    pub fn support_fraction(mut self, support_fraction: f64) -> Self {
        self.params.support_fraction = Some(support_fraction);
        self
    }

    /// Sets the seed or generator used for subset sampling
    pub fn random_state(mut self, random_state: impl Into<RandomState>) -> Self {
        self.params.random_state = random_state.into();
        self
    }

    pub fn build(self) -> McdDetector {
        McdDetector::new(self.params)
    }
}

/// State produced by a successful fit
#[derive(Debug, Clone)]
struct FittedDetector {
    estimator: FittedMinCovDet,
    training: TrainingScores,
}

/// Outlier detector based on the Minimum Covariance Determinant
///
/// # Example
///
/// ```rust
/// use nalgebra::DMatrix;
/// use robust_outlier::{McdDetector, OutlierDetector};
///
/// let mut x = DMatrix::from_fn(40, 2, |i, j| ((i + 1) as f64 * (0.9 + 0.8 * j as f64)).sin());
/// x[(7, 0)] = 25.0;
/// x[(7, 1)] = -25.0;
///
/// let mut detector = McdDetector::builder()
///     .contamination(0.025)
///     .random_state(42)
///     .build();
/// let labels = detector.fit_predict(&x, None).unwrap();
/// assert_eq!(labels.iter().filter(|&&l| l == 1).count(), 1);
/// assert_eq!(labels[7], 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct McdDetector {
    params: McdParams,
    fitted: Option<FittedDetector>,
}

impl McdDetector {
    pub fn new(params: McdParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn builder() -> McdDetectorBuilder {
        McdDetectorBuilder::new()
    }

    pub fn params(&self) -> &McdParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fitted(&self) -> Result<&FittedDetector> {
        self.fitted.as_ref().ok_or_else(|| Error::not_fitted(NAME))
    }

    /// The fitted covariance estimate
    pub fn estimator(&self) -> Result<&FittedMinCovDet> {
        Ok(&self.fitted()?.estimator)
    }

    /// Number of features seen during fit
    pub fn n_features(&self) -> Result<usize> {
        Ok(self.estimator()?.n_features())
    }

    /// Raw robust location, before correction and re-weighting
    pub fn raw_location(&self) -> Result<&DVector<f64>> {
        Ok(self.estimator()?.raw_location())
    }

    /// Raw robust covariance, before correction and re-weighting
    pub fn raw_covariance(&self) -> Result<&DMatrix<f64>> {
        Ok(self.estimator()?.raw_covariance())
    }

    /// Mask of the observations used for the raw estimates
    pub fn raw_support(&self) -> Result<&[bool]> {
        Ok(self.estimator()?.raw_support())
    }

    /// Robust location
    pub fn location(&self) -> Result<&DVector<f64>> {
        Ok(self.estimator()?.location())
    }

    /// Robust covariance
    pub fn covariance(&self) -> Result<&DMatrix<f64>> {
        Ok(self.estimator()?.covariance())
    }

    /// Pseudo-inverse of the robust covariance; `None` unless
    /// `store_precision` was set at fit time
    pub fn precision(&self) -> Result<Option<&DMatrix<f64>>> {
        Ok(self.estimator()?.stored_precision())
    }

    /// Mask of the observations used for the robust estimates
    pub fn support(&self) -> Result<&[bool]> {
        Ok(self.estimator()?.support())
    }
}

impl OutlierDetector for McdDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn contamination(&self) -> f64 {
        self.params.contamination
    }

    #[instrument(skip(self, x, y), fields(n_samples = x.nrows(), n_features = x.ncols()))]
    fn fit(&mut self, x: &DMatrix<f64>, y: Option<&[i64]>) -> Result<&mut Self> {
        self.fitted = None;
        validate_contamination(self.params.contamination)?;
        check_array(x, &CheckOptions::for_estimator(NAME))?;
        let n_classes = n_classes_from_targets(y, x.nrows())?;

        let estimator = MinCovDet::from(&self.params).fit(x)?;
        let training =
            TrainingScores::from_decision_scores(estimator.dist().to_vec(), self.params.contamination)?
                .with_n_classes(n_classes);
        debug!(
            threshold = training.threshold(),
            n_outliers = training.n_outliers(),
            "detector fitted"
        );

        self.fitted = Some(FittedDetector {
            estimator,
            training,
        });
        Ok(self)
    }

    /// Squared Mahalanobis distance of every row of `x` to the robust location
    fn decision_function(&self, x: &DMatrix<f64>) -> Result<Vec<f64>> {
        let estimator = self.estimator()?;
        check_array(x, &CheckOptions::for_estimator(NAME))?;
        estimator.mahalanobis(x)
    }

    fn training_scores(&self) -> Result<&TrainingScores> {
        Ok(&self.fitted()?.training)
    }
}
