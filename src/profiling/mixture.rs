//! Full-covariance Gaussian mixture fitted by expectation-maximisation.
//!
//! Responsibilities are initialised from a seeded k-means++ / Lloyd pass, so
//! identical input and seed always yield identical components.

use super::linalg::{log_sum_exp, squared_distance, to_matrix, to_rows};
use anyhow::{bail, Context, Result};
use nalgebra::{Cholesky, DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

const KMEANS_MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct MixtureConfig {
    pub n_components: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub reg_covar: f64,
    pub seed: u64,
}

/// Fitted mixture parameters: the sufficient statistics persisted with a profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GaussianMixture {
    pub weights: Vec<f64>,
    pub means: Vec<Vec<f64>>,
    pub covariances: Vec<Vec<Vec<f64>>>,
    pub converged: bool,
    pub n_iterations: usize,
    pub lower_bound: Option<f64>,
}

/// Hard labels plus the soft membership matrix (rows sum to 1).
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub labels: Vec<usize>,
    pub probabilities: Vec<Vec<f64>>,
}

impl GaussianMixture {
    pub fn fit(data: &[Vec<f64>], config: &MixtureConfig) -> Result<Self> {
        let n = data.len();
        let k = config.n_components;
        if n == 0 {
            bail!("Cannot fit a mixture model on an empty batch");
        }
        if k == 0 || k > n {
            bail!("Mixture needs between 1 and {n} components, got {k}");
        }
        let dims = data[0].len();

        let labels = kmeans_labels(data, k, config.seed);
        let mut resp: Vec<Vec<f64>> = labels
            .iter()
            .map(|&label| (0..k).map(|c| if c == label { 1.0 } else { 0.0 }).collect())
            .collect();

        let mut model = Self {
            weights: vec![0.0; k],
            means: vec![vec![0.0; dims]; k],
            covariances: vec![vec![vec![0.0; dims]; dims]; k],
            converged: false,
            n_iterations: 0,
            lower_bound: None,
        };
        model.maximization(data, &resp, config.reg_covar);

        for iteration in 1..=config.max_iterations {
            let previous = model.lower_bound.unwrap_or(f64::NEG_INFINITY);
            let (mean_log_likelihood, log_resp) = model.expectation(data)?;
            for (row, log_row) in resp.iter_mut().zip(&log_resp) {
                for (r, lr) in row.iter_mut().zip(log_row) {
                    *r = lr.exp();
                }
            }
            model.maximization(data, &resp, config.reg_covar);
            model.lower_bound = Some(mean_log_likelihood);
            model.n_iterations = iteration;
            if (mean_log_likelihood - previous).abs() < config.tolerance {
                model.converged = true;
                break;
            }
        }
        debug!(
            components = k,
            iterations = model.n_iterations,
            converged = model.converged,
            lower_bound = ?model.lower_bound,
            "Gaussian mixture fitted"
        );
        Ok(model)
    }

    pub fn n_components(&self) -> usize {
        self.weights.len()
    }

    pub fn dims(&self) -> usize {
        self.means.first().map(Vec::len).unwrap_or(0)
    }

    /// Labels (arg-max posterior, first wins on ties) and posteriors.
    pub fn assign(&self, data: &[Vec<f64>]) -> Result<Assignment> {
        let weighted = self.weighted_log_prob(data)?;
        let mut labels = Vec::with_capacity(data.len());
        let mut probabilities: Vec<Vec<f64>> = Vec::with_capacity(data.len());
        for row in weighted {
            let norm = log_sum_exp(&row);
            let mut best = 0;
            for (c, value) in row.iter().enumerate() {
                if *value > row[best] {
                    best = c;
                }
            }
            labels.push(best);
            probabilities.push(row.iter().map(|v| (v - norm).exp()).collect());
        }
        Ok(Assignment {
            labels,
            probabilities,
        })
    }

    fn expectation(&self, data: &[Vec<f64>]) -> Result<(f64, Vec<Vec<f64>>)> {
        let weighted = self.weighted_log_prob(data)?;
        let mut total = 0.0;
        let log_resp: Vec<Vec<f64>> = weighted
            .into_iter()
            .map(|row| {
                let norm = log_sum_exp(&row);
                total += norm;
                row.into_iter().map(|v| v - norm).collect()
            })
            .collect();
        let mean = total / data.len() as f64;
        if !mean.is_finite() {
            bail!("Mixture log-likelihood is not finite");
        }
        Ok((mean, log_resp))
    }

    fn maximization(&mut self, data: &[Vec<f64>], resp: &[Vec<f64>], reg_covar: f64) {
        let dims = self.dims();
        let points = to_matrix(data, dims);
        for c in 0..self.n_components() {
            let weights = DVector::from_iterator(data.len(), resp.iter().map(|r| r[c]));
            let nk = weights.sum() + 10.0 * f64::EPSILON;
            let mean: DVector<f64> = points.tr_mul(&weights) / nk;
            let mut cov = DMatrix::<f64>::zeros(dims, dims);
            for (i, row) in points.row_iter().enumerate() {
                let w = weights[i];
                if w == 0.0 {
                    continue;
                }
                let diff = row.transpose() - &mean;
                cov.ger(w, &diff, &diff, 1.0);
            }
            cov /= nk;
            for i in 0..dims {
                cov[(i, i)] += reg_covar;
            }
            self.weights[c] = nk;
            self.means[c] = mean.iter().copied().collect();
            self.covariances[c] = to_rows(&cov);
        }
        let total: f64 = self.weights.iter().sum();
        for w in self.weights.iter_mut() {
            *w /= total;
        }
    }

    fn weighted_log_prob(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let dims = self.dims();
        let constant = dims as f64 * (2.0 * PI).ln();
        let points = to_matrix(data, dims);
        let mut out = vec![Vec::with_capacity(self.n_components()); data.len()];
        for (c, cov) in self.covariances.iter().enumerate() {
            let Some(factor) = Cholesky::new(to_matrix(cov, dims)) else {
                bail!(
                    "Covariance of component {c} is not positive definite; try fewer clusters"
                );
            };
            let l = factor.l();
            let log_det = 2.0 * l.diagonal().iter().map(|d| d.ln()).sum::<f64>();
            let mean = DVector::from_column_slice(&self.means[c]);
            let log_weight = self.weights[c].ln();
            for (i, row) in points.row_iter().enumerate() {
                let diff = row.transpose() - &mean;
                let z = l
                    .solve_lower_triangular(&diff)
                    .context("Singular Cholesky factor while scoring")?;
                out[i].push(log_weight - 0.5 * (constant + log_det + z.norm_squared()));
            }
        }
        Ok(out)
    }
}

/// Seeded k-means++ seeding followed by Lloyd iterations.
fn kmeans_labels(data: &[Vec<f64>], k: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = data.len();
    let mut chosen = vec![rng.gen_range(0..n)];
    while chosen.len() < k {
        let dists: Vec<f64> = data
            .iter()
            .map(|row| {
                chosen
                    .iter()
                    .map(|&c| squared_distance(row, &data[c]))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = dists.iter().sum();
        let next = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            let mut pick = n - 1;
            for (idx, d) in dists.iter().enumerate() {
                acc += d;
                if acc >= target && *d > 0.0 {
                    pick = idx;
                    break;
                }
            }
            pick
        } else {
            (0..n).find(|idx| !chosen.contains(idx)).unwrap_or(0)
        };
        chosen.push(next);
    }
    let mut centroids: Vec<Vec<f64>> = chosen.iter().map(|&idx| data[idx].clone()).collect();

    let dims = data[0].len();
    let mut assignments = vec![usize::MAX; n];
    for _ in 0..KMEANS_MAX_ITERATIONS {
        let mut changed = false;
        for (idx, vector) in data.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = f64::MAX;
            for (centroid_idx, centroid) in centroids.iter().enumerate() {
                let dist = squared_distance(vector, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = centroid_idx;
                }
            }
            if assignments[idx] != best {
                assignments[idx] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        let mut accum = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (idx, vector) in data.iter().enumerate() {
            let cluster_id = assignments[idx];
            counts[cluster_id] += 1;
            for (dim, value) in vector.iter().enumerate() {
                accum[cluster_id][dim] += value;
            }
        }
        for (i, centroid) in centroids.iter_mut().enumerate() {
            if counts[i] == 0 {
                continue;
            }
            for dim in 0..dims {
                centroid[dim] = accum[i][dim] / counts[i] as f64;
            }
        }
    }
    assignments
}
