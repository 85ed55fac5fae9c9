//! Dense linear-algebra glue between the persisted row-major `Vec<Vec<f64>>`
//! statistics and `nalgebra` matrices.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Eigenvalues at or below this fraction of the largest one count as zero.
const EIGEN_RELATIVE_TOLERANCE: f64 = 1e-10;

/// Packs row-major rows into a matrix of width `n_cols`.
pub fn to_matrix(rows: &[Vec<f64>], n_cols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), n_cols, |i, j| rows[i][j])
}

/// Unpacks a matrix into row-major rows.
pub fn to_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

/// Eigen-decomposition of a symmetric matrix, as `(eigenvalue, unit eigenvector)`
/// pairs sorted by descending eigenvalue. Ties keep the solver's order.
pub fn symmetric_eigen(matrix: DMatrix<f64>) -> Vec<(f64, DVector<f64>)> {
    if matrix.nrows() == 0 {
        return Vec::new();
    }
    let eigen = SymmetricEigen::new(matrix);
    let mut pairs: Vec<(f64, DVector<f64>)> = eigen
        .eigenvalues
        .iter()
        .zip(eigen.eigenvectors.column_iter())
        .map(|(value, vector)| (*value, vector.into_owned()))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    pairs
}

/// Leading principal axes of the already-centred `data` (records x features),
/// with their variances. Only axes with non-negligible variance are returned,
/// at most `limit` of them.
///
/// When there are more features than records the n x n Gram matrix is
/// decomposed and its eigenvectors mapped back through `data^T`, which yields
/// the same non-zero spectrum as the p x p covariance.
pub fn principal_axes(data: &DMatrix<f64>, limit: usize) -> Vec<(f64, DVector<f64>)> {
    let (n, p) = data.shape();
    if n == 0 || p == 0 || limit == 0 {
        return Vec::new();
    }
    let denom = n.saturating_sub(1).max(1) as f64;
    let gram_side = n < p;
    let scatter = if gram_side {
        data * data.transpose()
    } else {
        data.transpose() * data
    };
    let pairs = symmetric_eigen(scatter / denom);
    let largest = pairs.first().map(|(v, _)| *v).unwrap_or(0.0).max(0.0);
    let floor = EIGEN_RELATIVE_TOLERANCE * largest.max(1.0);

    pairs
        .into_iter()
        .filter(|(value, _)| *value > floor)
        .take(limit)
        .filter_map(|(value, vector)| {
            if !gram_side {
                return Some((value, vector));
            }
            let axis = data.transpose() * vector;
            let norm = axis.norm();
            (norm > 0.0).then(|| (value, axis / norm))
        })
        .collect()
}

/// Numerically stable `ln(sum(exp(values)))`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
