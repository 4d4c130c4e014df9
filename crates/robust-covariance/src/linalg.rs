//! Dense linear-algebra helpers shared by the covariance estimators

use nalgebra::{DMatrix, DVector};

/// Per-feature mean of the rows of `x`
pub fn column_means(x: &DMatrix<f64>) -> DVector<f64> {
    let n = x.nrows() as f64;
    DVector::from_fn(x.ncols(), |j, _| x.column(j).iter().sum::<f64>() / n)
}

/// Maximum-likelihood covariance of the rows of `x` (divisor `n`)
///
/// With `assume_centered` the data is treated as having zero mean and is not
/// centered before the outer product.
pub fn empirical_covariance(x: &DMatrix<f64>, assume_centered: bool) -> DMatrix<f64> {
    let n = x.nrows() as f64;
    if assume_centered {
        return (x.transpose() * x) / n;
    }
    let mu = column_means(x);
    let centered = DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] - mu[j]);
    (centered.transpose() * &centered) / n
}

/// Pseudo-inverse of a symmetric matrix via its eigendecomposition
///
/// Eigenvalues below `max|λ| * n * ε` are treated as zero.
pub fn pinvh(a: &DMatrix<f64>) -> DMatrix<f64> {
    let n = a.nrows();
    let eigen = a.clone().symmetric_eigen();
    let largest = eigen
        .eigenvalues
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let cutoff = largest * n as f64 * f64::EPSILON;
    let inverted = eigen
        .eigenvalues
        .map(|l| if l.abs() > cutoff { 1.0 / l } else { 0.0 });
    let v = &eigen.eigenvectors;
    v * DMatrix::from_diagonal(&inverted) * v.transpose()
}

/// Rounding slack, in units of `n * ε`, allowed on a relative pivot
const PIVOT_SLACK: f64 = 100.0;

/// Log-determinant of a symmetric positive semi-definite matrix
///
/// Returns `-inf` when the matrix is singular or not positive definite.
/// Pivot `i` counts as singular when `L[i,i]² <= a[i,i] * n * ε` (up to a
/// small rounding slack): the share of feature `i` not explained by the
/// earlier features is lost in rounding. The test only looks at ratios, so
/// rescaling a feature does not change the verdict.
pub fn fast_logdet(a: &DMatrix<f64>) -> f64 {
    let n = a.nrows();
    let relative_tolerance = PIVOT_SLACK * n as f64 * f64::EPSILON;
    let Some(chol) = a.clone().cholesky() else {
        return f64::NEG_INFINITY;
    };
    let pivots = chol.l_dirty().diagonal();
    let degenerate = pivots
        .iter()
        .zip(a.diagonal().iter())
        .any(|(l, d)| l * l <= d.abs() * relative_tolerance);
    if degenerate {
        return f64::NEG_INFINITY;
    }
    let log_det = 2.0 * pivots.iter().map(|d| d.ln()).sum::<f64>();
    if log_det.is_finite() {
        log_det
    } else {
        f64::NEG_INFINITY
    }
}

/// Squared Mahalanobis distance of every row of `x` to `location`
pub fn squared_mahalanobis(
    x: &DMatrix<f64>,
    location: &DVector<f64>,
    precision: &DMatrix<f64>,
) -> Vec<f64> {
    let centered = DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] - location[j]);
    let projected = &centered * precision;
    (0..x.nrows())
        .map(|i| projected.row(i).dot(&centered.row(i)).max(0.0))
        .collect()
}

/// Number of singular values of `XᵀX` above `1e-8`
pub fn gram_rank(x: &DMatrix<f64>) -> usize {
    (x.transpose() * x)
        .singular_values()
        .iter()
        .filter(|&&s| s > 1e-8)
        .count()
}

/// Indices of the `true` entries of a mask
pub fn mask_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect()
}
