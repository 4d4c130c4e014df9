//! Maximum-likelihood covariance estimator

use crate::linalg::{column_means, empirical_covariance, pinvh};
use crate::traits::CovarianceModel;
use nalgebra::{DMatrix, DVector};
use robust_core::validation::{check_array, CheckOptions};
use robust_core::Result;
use serde::{Deserialize, Serialize};

/// Non-robust maximum-likelihood covariance estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmpiricalCovariance {
    store_precision: bool,
    assume_centered: bool,
}

impl Default for EmpiricalCovariance {
    fn default() -> Self {
        Self {
            store_precision: true,
            assume_centered: false,
        }
    }
}

impl EmpiricalCovariance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the precision matrix at fit time
    pub fn with_store_precision(mut self, store_precision: bool) -> Self {
        self.store_precision = store_precision;
        self
    }

    /// Treat the data as already centered
    pub fn with_assume_centered(mut self, assume_centered: bool) -> Self {
        self.assume_centered = assume_centered;
        self
    }

    pub fn fit(&self, x: &DMatrix<f64>) -> Result<FittedEmpiricalCovariance> {
        check_array(x, &CheckOptions::for_estimator("EmpiricalCovariance"))?;
        let location = if self.assume_centered {
            DVector::zeros(x.ncols())
        } else {
            column_means(x)
        };
        let covariance = empirical_covariance(x, self.assume_centered);
        let precision = self.store_precision.then(|| pinvh(&covariance));
        Ok(FittedEmpiricalCovariance {
            location,
            covariance,
            precision,
        })
    }
}

/// Result of [`EmpiricalCovariance::fit`]
#[derive(Debug, Clone)]
pub struct FittedEmpiricalCovariance {
    location: DVector<f64>,
    covariance: DMatrix<f64>,
    precision: Option<DMatrix<f64>>,
}

impl CovarianceModel for FittedEmpiricalCovariance {
    fn name(&self) -> &'static str {
        "EmpiricalCovariance"
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
