//! Standardisation and variance-maximising projection of one-hot matrices.
//!
//! Rows are standardised and projected onto at most `max_components`
//! principal axes before the mixture model sees them.

use super::linalg::{principal_axes, to_matrix, to_rows};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Per-column zero-mean / unit-variance scaling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fits column means and population standard deviations. Constant
    /// columns get a scale of 1 so they map to zero instead of NaN.
    pub fn fit(rows: &[Vec<f64>], n_cols: usize) -> Self {
        let n = rows.len().max(1) as f64;
        let mut mean = vec![0.0; n_cols];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }
        let mut var = vec![0.0; n_cols];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let sd = (v / n).sqrt();
                if sd > f64::EPSILON {
                    sd
                } else {
                    1.0
                }
            })
            .collect();
        Self { mean, scale }
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(x, (m, s))| (x - m) / s)
                    .collect()
            })
            .collect()
    }
}

/// Principal-component projection basis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Projection {
    pub mean: Vec<f64>,
    /// One unit-length axis per output dimension, each of input width.
    pub components: Vec<Vec<f64>>,
    pub explained_variance: Vec<f64>,
}

impl Projection {
    /// Fits `n_components` principal axes. When the data has fewer
    /// non-trivial axes than requested the remaining ones are zero vectors,
    /// which project every row to 0 on that dimension.
    pub fn fit(rows: &[Vec<f64>], n_cols: usize, n_components: usize) -> Self {
        let mut data = to_matrix(rows, n_cols);
        let mean: Vec<f64> = if rows.is_empty() {
            vec![0.0; n_cols]
        } else {
            data.column_iter().map(|column| column.mean()).collect()
        };
        for (j, m) in mean.iter().enumerate() {
            data.column_mut(j).add_scalar_mut(-m);
        }

        let mut components = Vec::with_capacity(n_components);
        let mut explained_variance = Vec::with_capacity(n_components);
        for (value, axis) in principal_axes(&data, n_components) {
            let mut vector: Vec<f64> = axis.iter().copied().collect();
            orient(&mut vector);
            components.push(vector);
            explained_variance.push(value);
        }
        while components.len() < n_components {
            components.push(vec![0.0; n_cols]);
            explained_variance.push(0.0);
        }
        Self {
            mean,
            components,
            explained_variance,
        }
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let width = self.mean.len();
        if width == 0 {
            return vec![vec![0.0; self.components.len()]; rows.len()];
        }
        let mut data = to_matrix(rows, width);
        for (j, m) in self.mean.iter().enumerate() {
            data.column_mut(j).add_scalar_mut(-m);
        }
        let basis = DMatrix::from_fn(width, self.components.len(), |i, c| self.components[c][i]);
        to_rows(&(data * basis))
    }
}

/// Makes the largest-magnitude entry positive so axes are reproducible.
fn orient(vector: &mut [f64]) {
    let pivot = vector
        .iter()
        .copied()
        .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        for x in vector.iter_mut() {
            *x = -*x;
        }
    }
}

/// Scaler and projection fitted together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reducer {
    pub scaler: StandardScaler,
    pub projection: Projection,
}

impl Reducer {
    /// Output width: `min(max_components, n_records, n_features)`, never below 1.
    pub fn component_count(max_components: usize, n_records: usize, n_features: usize) -> usize {
        max_components.min(n_records).min(n_features).max(1)
    }

    /// Fits on `rows` and returns the reducer with the reduced rows.
    pub fn fit_transform(
        rows: &[Vec<f64>],
        n_cols: usize,
        max_components: usize,
    ) -> (Self, Vec<Vec<f64>>) {
        let scaler = StandardScaler::fit(rows, n_cols);
        let scaled = scaler.transform(rows);
        let n_components = Self::component_count(max_components, rows.len(), n_cols);
        let projection = Projection::fit(&scaled, n_cols, n_components);
        let reduced = projection.transform(&scaled);
        (Self { scaler, projection }, reduced)
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        self.projection.transform(&self.scaler.transform(rows))
    }
}
