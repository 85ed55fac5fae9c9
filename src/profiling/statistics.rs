use super::analyze::StyleCluster;
use crate::records::{AttributeField, VltRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Portfolio-level aggregates stored on a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileStatistics {
    pub garment_distribution: BTreeMap<String, usize>,
    pub color_distribution: BTreeMap<String, usize>,
    pub style_distribution: BTreeMap<String, usize>,
    /// Clusters per record.
    pub diversity_score: f64,
    pub largest_cluster_percentage: f64,
}

impl ProfileStatistics {
    pub fn compute(records: &[VltRecord], clusters: &[StyleCluster]) -> Self {
        let mut stats = Self::default();
        stats.absorb(records);
        stats.refresh_cluster_metrics(clusters, records.len());
        stats
    }

    /// Adds the distributions of `records` to the running totals.
    pub fn absorb(&mut self, records: &[VltRecord]) {
        for record in records {
            let garment = record.garment_type().unwrap_or("unknown");
            *self
                .garment_distribution
                .entry(garment.to_string())
                .or_insert(0) += 1;
            if let Some(color) = record.field(AttributeField::PrimaryColor) {
                *self.color_distribution.entry(color.to_string()).or_insert(0) += 1;
            }
            if let Some(style) = record.field(AttributeField::OverallStyle) {
                *self.style_distribution.entry(style.to_string()).or_insert(0) += 1;
            }
        }
    }

    pub fn refresh_cluster_metrics(&mut self, clusters: &[StyleCluster], n_records: usize) {
        self.diversity_score = if n_records == 0 {
            0.0
        } else {
            clusters.len() as f64 / n_records as f64
        };
        self.largest_cluster_percentage = clusters
            .iter()
            .map(|c| c.percentage)
            .fold(0.0, f64::max);
    }
}
