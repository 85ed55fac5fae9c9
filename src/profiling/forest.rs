//! Feature importance by mean decrease in Gini impurity over a random forest
//! that predicts cluster labels from the one-hot (pre-reduction) features.

use super::features::FeatureMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Top `top_n` features by importance, highest first.
///
/// Empty when fewer than two distinct labels exist or there are no features.
pub fn rank_feature_importance(
    matrix: &FeatureMatrix,
    labels: &[usize],
    config: &ForestConfig,
    top_n: usize,
) -> Vec<FeatureImportance> {
    let mut classes: BTreeMap<usize, usize> = BTreeMap::new();
    for label in labels {
        let next = classes.len();
        classes.entry(*label).or_insert(next);
    }
    if classes.len() < 2 || matrix.n_cols() == 0 || config.n_trees == 0 {
        return Vec::new();
    }
    let targets: Vec<usize> = labels.iter().map(|l| classes[l]).collect();
    let importances = forest_importances(&matrix.rows, &targets, classes.len(), config);

    let mut ranked: Vec<FeatureImportance> = matrix
        .names
        .iter()
        .zip(importances)
        .map(|(name, importance)| FeatureImportance {
            feature: name.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(top_n);
    ranked
}

fn forest_importances(
    rows: &[Vec<f64>],
    targets: &[usize],
    n_classes: usize,
    config: &ForestConfig,
) -> Vec<f64> {
    let n = rows.len();
    let width = rows.first().map(Vec::len).unwrap_or(0);
    let max_features = ((width as f64).sqrt() as usize).max(1);

    let per_tree: Vec<Vec<f64>> = (0..config.n_trees)
        .into_par_iter()
        .map(|tree| {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(tree as u64));
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let grower = TreeGrower {
                rows,
                targets,
                n_classes,
                max_features,
            };
            let mut importance = grower.grow(sample, &mut rng);
            normalize(&mut importance);
            importance
        })
        .collect();

    let mut total = vec![0.0; width];
    for tree in &per_tree {
        for (t, v) in total.iter_mut().zip(tree) {
            *t += v;
        }
    }
    for t in total.iter_mut() {
        *t /= config.n_trees as f64;
    }
    normalize(&mut total);
    total
}

fn normalize(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

struct TreeGrower<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [usize],
    n_classes: usize,
    max_features: usize,
}

struct Split {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl TreeGrower<'_> {
    /// Grows one fully-developed tree over `sample` (indices may repeat) and
    /// returns the unnormalised impurity decrease attributed to each feature.
    fn grow(&self, sample: Vec<usize>, rng: &mut StdRng) -> Vec<f64> {
        let width = self.rows.first().map(Vec::len).unwrap_or(0);
        let mut importance = vec![0.0; width];
        let mut stack = vec![sample];
        while let Some(node) = stack.pop() {
            if node.len() < 2 || self.is_pure(&node) {
                continue;
            }
            let Some(split) = self.best_split(&node, rng) else {
                continue;
            };
            importance[split.feature] += split.decrease;
            let (left, right): (Vec<usize>, Vec<usize>) = node
                .into_iter()
                .partition(|&idx| self.rows[idx][split.feature] <= split.threshold);
            stack.push(right);
            stack.push(left);
        }
        importance
    }

    fn is_pure(&self, node: &[usize]) -> bool {
        let first = self.targets[node[0]];
        node.iter().all(|&idx| self.targets[idx] == first)
    }

    fn best_split(&self, node: &[usize], rng: &mut StdRng) -> Option<Split> {
        let mut features: Vec<usize> = (0..self.rows[node[0]].len()).collect();
        features.shuffle(rng);

        let n = node.len() as f64;
        let mut parent_counts = vec![0usize; self.n_classes];
        for &idx in node {
            parent_counts[self.targets[idx]] += 1;
        }
        let parent_gini = gini(&parent_counts, node.len());

        let mut best: Option<Split> = None;
        let mut informative_seen = 0;
        for feature in features {
            if informative_seen >= self.max_features {
                break;
            }
            let mut values: Vec<(f64, usize)> = node
                .iter()
                .map(|&idx| (self.rows[idx][feature], self.targets[idx]))
                .collect();
            values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            if values[0].0 == values[values.len() - 1].0 {
                continue;
            }
            informative_seen += 1;

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent_counts.clone();
            for i in 0..values.len() - 1 {
                let (value, class) = values[i];
                left[class] += 1;
                right[class] -= 1;
                let next = values[i + 1].0;
                if next <= value {
                    continue;
                }
                let n_left = i + 1;
                let n_right = values.len() - n_left;
                let children = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n;
                let decrease = n * (parent_gini - children);
                if best.as_ref().map_or(true, |b| decrease > b.decrease) {
                    best = Some(Split {
                        feature,
                        threshold: (value + next) / 2.0,
                        decrease,
                    });
                }
            }
        }
        best
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}
