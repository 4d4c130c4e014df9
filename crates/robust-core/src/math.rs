//! Mathematical utilities for robust statistical analysis
//!
//! Thin wrappers over `statrs` for the distribution functions needed by
//! covariance consistency corrections and detector confidence scoring.

use crate::{Error, Result};

/// Distribution-related mathematical functions
pub mod distributions {
    /// Chi-squared distribution utilities
    pub mod chi_squared {
        use crate::{Error, Result};
        use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};

        const NEWTON_STEPS: usize = 4;

        /// Inverse survival function: the `x` with `P(X > x) = q`
        ///
        /// Equivalent to `ppf(1 - q)`. The statrs quantile is polished with a
        /// few Newton steps on the CDF.
        pub fn isf(degrees_of_freedom: f64, q: f64) -> Result<f64> {
            if !(0.0..=1.0).contains(&q) || q.is_nan() {
                return Err(Error::InvalidParameter(format!(
                    "Survival probability {q} must be in [0, 1]"
                )));
            }
            let dist = ChiSquared::new(degrees_of_freedom)
                .map_err(|e| Error::Computation(format!("chi2({degrees_of_freedom}): {e}")))?;
            if q == 1.0 {
                return Ok(0.0);
            }
            if q == 0.0 {
                return Ok(f64::INFINITY);
            }

            let p = 1.0 - q;
            let mut x = dist.inverse_cdf(p).max(f64::MIN_POSITIVE);
            for _ in 0..NEWTON_STEPS {
                let density = dist.pdf(x);
                if !(density.is_finite() && density > 0.0) {
                    break;
                }
                let next = x - (dist.cdf(x) - p) / density;
                if !(next.is_finite() && next > 0.0) || next == x {
                    break;
                }
                x = next;
            }
            Ok(x)
        }

        /// Median of the chi-squared distribution
        pub fn median(degrees_of_freedom: f64) -> Result<f64> {
            isf(degrees_of_freedom, 0.5)
        }
    }

    /// Binomial distribution utilities
    pub mod binomial {
        use crate::{Error, Result};
        use statrs::distribution::{Binomial, DiscreteCDF};

        /// `P(X <= k)` for `X ~ Binomial(n, p)`
        pub fn cdf(k: u64, n: u64, p: f64) -> Result<f64> {
            let dist = Binomial::new(p, n)
                .map_err(|e| Error::Computation(format!("binomial(n={n}, p={p}): {e}")))?;
            Ok(dist.cdf(k))
        }
    }

    /// Normal distribution utilities
    pub mod normal {
        /// Gauss error function
        pub fn erf(x: f64) -> f64 {
            statrs::function::erf::erf(x)
        }
    }
}

/// Clamp a probability into `[0, 1]`, rejecting NaN
pub fn clip_probability(p: f64) -> Result<f64> {
    if p.is_nan() {
        return Err(Error::Computation("probability is NaN".to_string()));
    }
    Ok(p.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::distributions::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_chi2_median() {
        // Known values: chi2(1) median ~ 0.454936, chi2(2) median = 2 ln 2
        assert_relative_eq!(
            chi_squared::median(1.0).unwrap(),
            0.454_936_423_119_572_7,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            chi_squared::median(2.0).unwrap(),
            2.0 * std::f64::consts::LN_2,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_chi2_upper_tail() {
        // chi2(2).isf(0.025) = -2 ln 0.025
        assert_relative_eq!(
            chi_squared::isf(2.0, 0.025).unwrap(),
            -2.0 * 0.025_f64.ln(),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            chi_squared::isf(3.0, 0.025).unwrap(),
            9.348_403_604_496_14,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_chi2_isf_matches_survival() {
        use statrs::distribution::{ChiSquared, ContinuousCDF};
        for &df in &[1.0, 2.0, 5.0, 20.0] {
            let dist = ChiSquared::new(df).unwrap();
            for &q in &[0.9, 0.5, 0.1, 0.025, 0.001] {
                let x = chi_squared::isf(df, q).unwrap();
                assert_relative_eq!(1.0 - dist.cdf(x), q, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_chi2_edges() {
        assert_eq!(chi_squared::isf(2.0, 1.0).unwrap(), 0.0);
        assert!(chi_squared::isf(2.0, 0.0).unwrap().is_infinite());
        assert!(chi_squared::isf(2.0, 1.5).is_err());
        assert!(chi_squared::isf(0.0, 0.5).is_err());
    }

    #[test]
    fn test_binomial_cdf() {
        // Binomial(4, 0.5): P(X <= 1) = 5/16
        assert_relative_eq!(binomial::cdf(1, 4, 0.5).unwrap(), 5.0 / 16.0, epsilon = 1e-12);
        assert_relative_eq!(binomial::cdf(4, 4, 0.3).unwrap(), 1.0, epsilon = 1e-12);
        assert!(binomial::cdf(1, 4, 1.5).is_err());
    }

    #[test]
    fn test_erf() {
        assert_relative_eq!(normal::erf(0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(normal::erf(1.0), 0.842_700_792_949_714_9, epsilon = 1e-9);
        assert_relative_eq!(normal::erf(-1.0), -0.842_700_792_949_714_9, epsilon = 1e-9);
    }

    #[test]
    fn test_clip_probability() {
        assert_eq!(clip_probability(1.3).unwrap(), 1.0);
        assert_eq!(clip_probability(-0.2).unwrap(), 0.0);
        assert!(clip_probability(f64::NAN).is_err());
    }
}
