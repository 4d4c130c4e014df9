//! Common interface for unsupervised outlier detectors

use crate::threshold::{ProbabilityMethod, TrainingScores};
use nalgebra::DMatrix;
use robust_core::Result;

/// An unsupervised outlier detector
///
/// Implementors fit on a sample matrix (rows are samples) and score new rows;
/// larger scores are more anomalous. The threshold, labels and the
/// prediction helpers are shared through [`TrainingScores`].
///
/// Every method other than `fit` fails with `NotFitted` until a fit has
/// succeeded.
pub trait OutlierDetector {
    /// Name used in error messages
    fn name(&self) -> &'static str;

    /// Expected fraction of outliers in the training data
    fn contamination(&self) -> f64;

    /// Fit the detector on `x`
    ///
    /// `y` is only used to count classes. A failed fit leaves the detector
    /// unfitted.
    fn fit(&mut self, x: &DMatrix<f64>, y: Option<&[i64]>) -> Result<&mut Self>;

    /// Raw outlier score of every row of `x`
    fn decision_function(&self, x: &DMatrix<f64>) -> Result<Vec<f64>>;

    /// Threshold and labels derived from the last fit
    fn training_scores(&self) -> Result<&TrainingScores>;

    /// Outlier scores of the training samples
    fn decision_scores(&self) -> Result<&[f64]> {
        Ok(self.training_scores()?.decision_scores())
    }

    /// Score separating inliers from outliers
    fn threshold(&self) -> Result<f64> {
        Ok(self.training_scores()?.threshold())
    }

    /// Binary labels of the training samples (1 = outlier)
    fn labels(&self) -> Result<&[u8]> {
        Ok(self.training_scores()?.labels())
    }

    /// Number of classes seen in the training targets
    fn n_classes(&self) -> Result<usize> {
        Ok(self.training_scores()?.n_classes())
    }

    /// Label every row of `x`: 1 iff its score exceeds the threshold
    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<u8>> {
        let training = self.training_scores()?;
        let scores = self.decision_function(x)?;
        Ok(scores.into_iter().map(|s| training.label(s)).collect())
    }

    /// Labels together with the confidence in each label
    fn predict_with_confidence(&self, x: &DMatrix<f64>) -> Result<(Vec<u8>, Vec<f64>)> {
        let training = self.training_scores()?;
        let scores = self.decision_function(x)?;
        let labels = scores.iter().map(|&s| training.label(s)).collect();
        let confidence = scores
            .iter()
            .map(|&s| training.confidence(s))
            .collect::<Result<Vec<_>>>()?;
        Ok((labels, confidence))
    }

    /// `[p_inlier, p_outlier]` for every row of `x`
    fn predict_proba(&self, x: &DMatrix<f64>, method: ProbabilityMethod) -> Result<Vec<[f64; 2]>> {
        let training = self.training_scores()?;
        self.decision_function(x)?
            .into_iter()
            .map(|s| {
                let outlier = training.outlier_probability(s, method)?;
                Ok([1.0 - outlier, outlier])
            })
            .collect()
    }

    /// Confidence in the predicted label of every row of `x`
    fn predict_confidence(&self, x: &DMatrix<f64>) -> Result<Vec<f64>> {
        let training = self.training_scores()?;
        self.decision_function(x)?
            .into_iter()
            .map(|s| training.confidence(s))
            .collect()
    }

    /// Fit on `x` and return the training labels
    fn fit_predict(&mut self, x: &DMatrix<f64>, y: Option<&[i64]>) -> Result<Vec<u8>> {
        self.fit(x, y)?;
        Ok(self.labels()?.to_vec())
    }
}
