//! Utility functions for working with data slices

/// Indices that sort `data` ascending
///
/// The sort is stable: equal values keep their original relative order.
/// NaN values are ordered after every other value.
///
/// # Examples
///
/// ```rust
/// use robust_core::utils::argsort;
///
/// let data = [3.0, 1.0, 2.0, 1.0];
/// assert_eq!(argsort(&data), vec![1, 3, 2, 0]);
/// ```
pub fn argsort(data: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by(|&a, &b| match (data[a].is_nan(), data[b].is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => data[a].total_cmp(&data[b]),
    });
    order
}

/// Sort data and return a new vector
///
/// Handles NaN values by placing them at the end.
///
/// # Examples
///
/// ```rust
/// use robust_core::utils::sorted;
///
/// let data = vec![3.0, 1.0, 5.0, 2.0, 4.0];
/// assert_eq!(sorted(&data), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
/// ```
pub fn sorted(data: &[f64]) -> Vec<f64> {
    argsort(data).into_iter().map(|i| data[i]).collect()
}

/// Calculate the mean of a slice
///
/// Returns 0.0 for empty slices.
///
/// # Examples
///
/// ```rust
/// use robust_core::utils::mean;
///
/// assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
/// assert_eq!(mean(&[]), 0.0);
/// ```
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().map(|&x| x / data.len() as f64).sum()
}

/// Population standard deviation (divisor `n`)
///
/// Returns 0.0 for empty slices.
///
/// # Examples
///
/// ```rust
/// use robust_core::utils::population_std;
///
/// let sd = population_std(&[1.0, 2.0, 3.0, 4.0, 5.0]);
/// assert!((sd - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn population_std(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance: f64 = data
        .iter()
        .map(|&x| {
            let diff = x - m;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    variance.sqrt()
}

/// Median of a slice, averaging the two middle values for even lengths
///
/// Returns NaN for empty slices.
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let s = sorted(data);
    let mid = s.len() / 2;
    if s.len() % 2 == 0 {
        0.5 * (s[mid - 1] + s[mid])
    } else {
        s[mid]
    }
}
