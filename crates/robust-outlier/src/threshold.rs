//! Contamination thresholds and score post-processing
//!
//! A detector's training scores are turned into a threshold and binary
//! labels from the contamination fraction. The same statistics drive the
//! probability and confidence conversions of new scores.

use robust_core::math::distributions::{binomial, normal};
use robust_core::math::clip_probability;
use robust_core::utils::{argsort, mean, population_std, sorted};
use robust_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::SQRT_2;
use tracing::warn;

/// Largest contamination a detector accepts
pub const MAX_CONTAMINATION: f64 = 0.5;

/// Number of classes assumed when no targets are given
pub const DEFAULT_N_CLASSES: usize = 2;

/// How raw outlier scores are mapped to probabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbabilityMethod {
    /// Min-max scaling against the training scores
    #[default]
    Linear,
    /// Gaussian scaling: `erf((s - mean) / (std * sqrt(2)))`
    Unify,
}

/// Check that `contamination` lies in `(0, 0.5]`
pub fn validate_contamination(contamination: f64) -> Result<()> {
    if contamination > 0.0 && contamination <= MAX_CONTAMINATION {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "contamination must be in (0, {MAX_CONTAMINATION}], got: {contamination}"
        )))
    }
}

/// Number of distinct classes in optional training targets
///
/// Returns [`DEFAULT_N_CLASSES`] when `y` is absent. Targets are not used by
/// unsupervised detectors, so passing them logs a warning.
pub fn n_classes_from_targets(y: Option<&[i64]>, n_samples: usize) -> Result<usize> {
    let Some(y) = y else {
        return Ok(DEFAULT_N_CLASSES);
    };
    robust_core::validation::check_consistent_length(n_samples, y, "y")?;
    let n_classes = y.iter().collect::<HashSet<_>>().len();
    warn!(n_classes, "y should not be presented in unsupervised learning");
    Ok(n_classes)
}

/// Threshold, labels and summary statistics of the training scores
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingScores {
    decision_scores: Vec<f64>,
    sorted_scores: Vec<f64>,
    threshold: f64,
    labels: Vec<u8>,
    contamination: f64,
    mean: f64,
    std: f64,
    n_classes: usize,
}

impl TrainingScores {
    /// Derive the threshold and labels from training scores
    ///
    /// With `n` scores, `k = round(n * contamination)` (clamped to `n - 1`)
    /// samples are labelled 1: the last `k` in a stable ascending sort, so
    /// exactly `k` labels are set even when scores tie. The threshold is the
    /// largest inlier score, `sorted[n - k - 1]`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use robust_outlier::TrainingScores;
    ///
    /// let scores = vec![0.1, 0.4, 0.2, 9.0, 0.3, 0.5, 0.2, 0.1, 0.3, 0.4];
    /// let training = TrainingScores::from_decision_scores(scores, 0.1).unwrap();
    /// assert_eq!(training.labels(), &[0, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
    /// assert_eq!(training.threshold(), 0.5);
    /// ```
    pub fn from_decision_scores(decision_scores: Vec<f64>, contamination: f64) -> Result<Self> {
        validate_contamination(contamination)?;
        let n = decision_scores.len();
        if n == 0 {
            return Err(Error::InvalidInput(
                "cannot derive a threshold from zero decision scores".to_string(),
            ));
        }
        if decision_scores.iter().any(|s| !s.is_finite()) {
            return Err(Error::Computation(
                "decision scores contain non-finite values".to_string(),
            ));
        }

        let n_outliers = ((n as f64 * contamination).round() as usize).min(n - 1);
        let order = argsort(&decision_scores);
        let mut labels = vec![0u8; n];
        for &i in &order[n - n_outliers..] {
            labels[i] = 1;
        }
        let threshold = decision_scores[order[n - n_outliers - 1]];

        Ok(Self {
            sorted_scores: sorted(&decision_scores),
            mean: mean(&decision_scores),
            std: population_std(&decision_scores),
            decision_scores,
            threshold,
            labels,
            contamination,
            n_classes: DEFAULT_N_CLASSES,
        })
    }

    /// Record the number of classes seen in the training targets
    pub fn with_n_classes(mut self, n_classes: usize) -> Self {
        self.n_classes = n_classes;
        self
    }

    pub fn decision_scores(&self) -> &[f64] {
        &self.decision_scores
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_samples(&self) -> usize {
        self.decision_scores.len()
    }

    /// Number of training samples labelled as outliers
    pub fn n_outliers(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    /// Mean of the training scores
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation of the training scores
    pub fn std(&self) -> f64 {
        self.std
    }

    /// Label of a new score: 1 iff it exceeds the threshold
    pub fn label(&self, score: f64) -> u8 {
        u8::from(score > self.threshold)
    }

    /// Outlier probability of a new score
    pub fn outlier_probability(&self, score: f64, method: ProbabilityMethod) -> Result<f64> {
        let p = match method {
            ProbabilityMethod::Linear => {
                let min = self.sorted_scores[0];
                let max = self.sorted_scores[self.sorted_scores.len() - 1];
                let range = if max > min { max - min } else { 1.0 };
                (score - min) / range
            }
            ProbabilityMethod::Unify => {
                if self.std > 0.0 {
                    normal::erf((score - self.mean) / (self.std * SQRT_2))
                } else if score > self.mean {
                    1.0
                } else {
                    0.0
                }
            }
        };
        clip_probability(p)
    }

    /// Confidence in the label of a new score
    ///
    /// The rank of `score` among the training scores gives a Beta posterior
    /// mean `(1 + #{train <= score}) / (2 + n)`; the confidence that the
    /// sample is an outlier is `1 - BinomCDF(n - floor(n * c); n, posterior)`.
    /// Samples labelled as inliers report the complement.
    pub fn confidence(&self, score: f64) -> Result<f64> {
        let n = self.n_samples();
        let at_or_below = self.sorted_scores.partition_point(|&s| s <= score);
        let posterior = (1 + at_or_below) as f64 / (2 + n) as f64;
        let inliers = n - (n as f64 * self.contamination).floor() as usize;
        let confidence = 1.0 - binomial::cdf(inliers as u64, n as u64, posterior)?;
        let confidence = if self.label(score) == 1 {
            confidence
        } else {
            1.0 - confidence
        };
        clip_probability(confidence)
    }
}
