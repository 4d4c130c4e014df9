//! FastMCD: concentration steps over random subsets
//!
//! Rousseeuw & Van Driessen, "A Fast Algorithm for the Minimum Covariance
//! Determinant Estimator", Technometrics 41(3), 1999.

use crate::linalg::{column_means, empirical_covariance, fast_logdet, pinvh, squared_mahalanobis};
use crate::random::permutation;
use nalgebra::{DMatrix, DVector};
use rand_chacha::ChaCha8Rng;
use robust_core::utils::{argsort, mean, sorted};
use robust_core::{Error, Result};
use tracing::{debug, warn};

/// Total number of random trials spread over the subsets of a large sample
const TOTAL_TRIALS: usize = 500;
/// Target size of the subsets a large sample is split into
const SUBSET_SIZE: usize = 300;
/// Largest merged sample refined before the final full-data pass
const MERGED_SIZE: usize = 1500;
/// Candidates kept per subset
const BEST_PER_SUBSET: usize = 10;
/// Random trials on a small sample
const SMALL_SAMPLE_TRIALS: usize = 30;
/// Candidates kept after the short first pass on a small sample
const SMALL_SAMPLE_BEST: usize = 10;
/// C-steps per trial in the short first pass
const SHORT_ITERATIONS: usize = 2;
/// C-steps allowed when refining candidates
const REFINE_ITERATIONS: usize = 30;

/// One location/covariance candidate and the support it was computed on
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub location: DVector<f64>,
    pub covariance: DMatrix<f64>,
    pub log_det: f64,
    pub support: Vec<bool>,
    pub dist: Vec<f64>,
}

/// Raw (uncorrected, unweighted) MCD estimate
#[derive(Debug, Clone)]
pub(crate) struct RawMcd {
    pub location: DVector<f64>,
    pub covariance: DMatrix<f64>,
    pub support: Vec<bool>,
    pub dist: Vec<f64>,
}

/// Starting point of a run of C-steps
enum Start<'a> {
    /// Initial support given as row indices
    Subset(Vec<usize>),
    /// Initial support taken from the closest points to a previous estimate
    Estimate {
        location: &'a DVector<f64>,
        covariance: &'a DMatrix<f64>,
    },
}

/// How the trials of [`select_candidates`] are initialised
enum Trials<'a> {
    Random(usize),
    From(&'a [Candidate]),
}

/// Number of points in the raw support
pub(crate) fn support_size(
    n_samples: usize,
    n_features: usize,
    support_fraction: Option<f64>,
) -> Result<usize> {
    let n_support = match support_fraction {
        None => (0.5 * (n_samples + n_features + 1) as f64).ceil() as usize,
        Some(fraction) => {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(Error::InvalidParameter(format!(
                    "support_fraction must be in (0, 1], got {fraction}"
                )));
            }
            (fraction * n_samples as f64) as usize
        }
    };
    if n_support == 0 {
        return Err(Error::InvalidParameter(format!(
            "support_fraction selects no samples out of {n_samples}"
        )));
    }
    Ok(n_support.min(n_samples))
}

/// Run FastMCD and return the raw estimate
pub(crate) fn fast_mcd(
    x: &DMatrix<f64>,
    support_fraction: Option<f64>,
    rng: &mut ChaCha8Rng,
) -> Result<RawMcd> {
    let (n_samples, n_features) = x.shape();
    let n_support = support_size(n_samples, n_features, support_fraction)?;
    debug!(n_samples, n_features, n_support, "starting FastMCD");

    if n_features == 1 {
        return Ok(univariate(x, n_support));
    }
    if n_samples > 500 {
        large_sample(x, n_support, rng)
    } else {
        let best = select_candidates(
            x,
            n_support,
            Trials::Random(SMALL_SAMPLE_TRIALS),
            SMALL_SAMPLE_BEST,
            SHORT_ITERATIONS,
            rng,
        )?;
        let full = select_candidates(x, n_support, Trials::From(&best), 1, REFINE_ITERATIONS, rng)?;
        Ok(first(full)?.into())
    }
}

/// Exact MCD in one dimension: the shortest half of the sorted data
///
/// Each candidate window `s[i..i + n_support]` holds exactly `n_support`
/// sorted values, the same count the support is later filled with. The
/// location is the mean of the midpoints of every shortest window.
fn univariate(x: &DMatrix<f64>, n_support: usize) -> RawMcd {
    let n_samples = x.nrows();
    let values: Vec<f64> = x.column(0).iter().copied().collect();

    let (location, support) = if n_support < n_samples {
        let s = sorted(&values);
        let widths: Vec<f64> = (0..=n_samples - n_support)
            .map(|i| s[i + n_support - 1] - s[i])
            .collect();
        let shortest = widths.iter().copied().fold(f64::INFINITY, f64::min);
        let midpoints: Vec<f64> = widths
            .iter()
            .enumerate()
            .filter(|(_, w)| **w == shortest)
            .map(|(i, _)| 0.5 * (s[i + n_support - 1] + s[i]))
            .collect();
        let location = mean(&midpoints);

        let deviations: Vec<f64> = values.iter().map(|v| (v - location).abs()).collect();
        let mut support = vec![false; n_samples];
        for &i in &argsort(&deviations)[..n_support] {
            support[i] = true;
        }
        (location, support)
    } else {
        (mean(&values), vec![true; n_samples])
    };

    let supported: Vec<f64> = values
        .iter()
        .zip(&support)
        .filter_map(|(&v, &keep)| keep.then_some(v))
        .collect();
    // The variance is centered on the support mean, not on the shortest-half midpoint
    let support_mean = mean(&supported);
    let variance = mean(
        &supported
            .iter()
            .map(|v| (v - support_mean) * (v - support_mean))
            .collect::<Vec<_>>(),
    );

    let location = DVector::from_element(1, location);
    let covariance = DMatrix::from_element(1, 1, variance);
    let dist = squared_mahalanobis(x, &location, &pinvh(&covariance));
    RawMcd {
        location,
        covariance,
        support,
        dist,
    }
}

/// Split a large sample into subsets, pool their best candidates, and refine
fn large_sample(x: &DMatrix<f64>, n_support: usize, rng: &mut ChaCha8Rng) -> Result<RawMcd> {
    let n_samples = x.nrows();
    let n_subsets = n_samples / SUBSET_SIZE;
    let subset_len = n_samples / n_subsets;
    let support_ratio = n_support as f64 / n_samples as f64;
    let subset_support = (subset_len as f64 * support_ratio).ceil() as usize;
    let trials_per_subset = (TOTAL_TRIALS / n_subsets).max(10);
    debug!(n_subsets, subset_len, trials_per_subset, "FastMCD on subsets");

    let shuffled = permutation(rng, n_samples);
    let mut pooled = Vec::with_capacity(n_subsets * BEST_PER_SUBSET);
    for rows in shuffled.chunks_exact(subset_len).take(n_subsets) {
        let subset = x.select_rows(rows.iter());
        pooled.extend(select_candidates(
            &subset,
            subset_support,
            Trials::Random(trials_per_subset),
            BEST_PER_SUBSET,
            SHORT_ITERATIONS,
            rng,
        )?);
    }

    let merged_len = n_samples.min(MERGED_SIZE);
    let merged_support = (merged_len as f64 * support_ratio).ceil() as usize;
    let merged_best = if n_samples > MERGED_SIZE { 10 } else { 1 };
    let mut selection = permutation(rng, n_samples);
    selection.truncate(merged_len);
    let merged = x.select_rows(selection.iter());
    let refined = select_candidates(
        &merged,
        merged_support,
        Trials::From(&pooled),
        merged_best,
        REFINE_ITERATIONS,
        rng,
    )?;

    if n_samples < MERGED_SIZE {
        // The merged sample is a permutation of the whole data set
        let best = first(refined)?;
        let mut support = vec![false; n_samples];
        let mut dist = vec![0.0; n_samples];
        for (k, &row) in selection.iter().enumerate() {
            support[row] = best.support[k];
            dist[row] = best.dist[k];
        }
        Ok(RawMcd {
            location: best.location,
            covariance: best.covariance,
            support,
            dist,
        })
    } else {
        let full = select_candidates(x, n_support, Trials::From(&refined), 1, REFINE_ITERATIONS, rng)?;
        Ok(first(full)?.into())
    }
}

/// Run C-steps from every trial start and keep the `select` lowest determinants
fn select_candidates(
    x: &DMatrix<f64>,
    n_support: usize,
    trials: Trials<'_>,
    select: usize,
    n_iterations: usize,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<Candidate>> {
    // Random starts are drawn up front so the trials themselves are independent
    let starts: Vec<Start<'_>> = match trials {
        Trials::Random(n_trials) => (0..n_trials)
            .map(|_| {
                let mut subset = permutation(rng, x.nrows());
                subset.truncate(n_support);
                Start::Subset(subset)
            })
            .collect(),
        Trials::From(candidates) => candidates
            .iter()
            .map(|c| Start::Estimate {
                location: &c.location,
                covariance: &c.covariance,
            })
            .collect(),
    };

    let mut candidates = run_trials(x, n_support, starts, n_iterations)?;
    candidates.sort_by(|a, b| a.log_det.total_cmp(&b.log_det));
    candidates.truncate(select);
    Ok(candidates)
}

/// C-steps from each start, one rayon task per trial
#[cfg(feature = "parallel")]
fn run_trials(
    x: &DMatrix<f64>,
    n_support: usize,
    starts: Vec<Start<'_>>,
    n_iterations: usize,
) -> Result<Vec<Candidate>> {
    use rayon::prelude::*;
    starts
        .into_par_iter()
        .map(|start| c_step(x, n_support, start, n_iterations))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn run_trials(
    x: &DMatrix<f64>,
    n_support: usize,
    starts: Vec<Start<'_>>,
    n_iterations: usize,
) -> Result<Vec<Candidate>> {
    starts
        .into_iter()
        .map(|start| c_step(x, n_support, start, n_iterations))
        .collect()
}

/// Concentration steps: move the support to the `n_support` closest points
/// until the covariance determinant stops decreasing
fn c_step(
    x: &DMatrix<f64>,
    n_support: usize,
    start: Start<'_>,
    max_iterations: usize,
) -> Result<Candidate> {
    let n_samples = x.nrows();
    let (mut support, mut dist) = match start {
        Start::Subset(rows) => (rows, vec![f64::INFINITY; n_samples]),
        Start::Estimate {
            location,
            covariance,
        } => {
            let dist = squared_mahalanobis(x, location, &pinvh(covariance));
            (closest(&dist, n_support), dist)
        }
    };
    let (mut location, mut covariance) = support_estimates(x, &support);
    let mut log_det = fast_logdet(&covariance);

    let mut previous: Option<(DVector<f64>, DMatrix<f64>, Vec<usize>)> = None;
    let mut previous_log_det = f64::INFINITY;
    let mut precision = None;
    let mut remaining = max_iterations;
    while log_det < previous_log_det && remaining > 0 && log_det.is_finite() {
        previous_log_det = log_det;
        let current_precision = pinvh(&covariance);
        dist = squared_mahalanobis(x, &location, &current_precision);
        let next_support = closest(&dist, n_support);
        let (next_location, next_covariance) = support_estimates(x, &next_support);

        previous = Some((
            std::mem::replace(&mut location, next_location),
            std::mem::replace(&mut covariance, next_covariance),
            std::mem::replace(&mut support, next_support),
        ));
        log_det = fast_logdet(&covariance);
        precision = Some(current_precision);
        remaining -= 1;
    }

    if log_det.is_infinite() {
        return Err(Error::singular_covariance());
    }

    let increased = remaining > 0 && log_det > previous_log_det && !is_close(log_det, previous_log_det);
    if increased {
        if let Some((prev_location, prev_covariance, prev_support)) = previous {
            warn!(
                log_det,
                previous_log_det, "determinant increased during C-steps; keeping previous estimate"
            );
            return Ok(Candidate {
                location: prev_location,
                covariance: prev_covariance,
                log_det: previous_log_det,
                support: to_mask(&prev_support, n_samples),
                dist,
            });
        }
    }

    let precision = precision.unwrap_or_else(|| pinvh(&covariance));
    let dist = squared_mahalanobis(x, &location, &precision);
    Ok(Candidate {
        location,
        covariance,
        log_det,
        support: to_mask(&support, n_samples),
        dist,
    })
}

/// Location and covariance of the given rows
fn support_estimates(x: &DMatrix<f64>, rows: &[usize]) -> (DVector<f64>, DMatrix<f64>) {
    let subset = x.select_rows(rows.iter());
    (column_means(&subset), empirical_covariance(&subset, false))
}

/// Indices of the `k` smallest distances
fn closest(dist: &[f64], k: usize) -> Vec<usize> {
    let mut order = argsort(dist);
    order.truncate(k);
    order
}

fn to_mask(rows: &[usize], n_samples: usize) -> Vec<bool> {
    let mut mask = vec![false; n_samples];
    for &i in rows {
        mask[i] = true;
    }
    mask
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

fn first(candidates: Vec<Candidate>) -> Result<Candidate> {
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::EstimatorFailure("FastMCD produced no candidate".to_string()))
}

impl From<Candidate> for RawMcd {
    fn from(c: Candidate) -> Self {
        Self {
            location: c.location,
            covariance: c.covariance,
            support: c.support,
            dist: c.dist,
        }
    }
}
