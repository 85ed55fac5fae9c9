//! Data structures backing persisted style profiles.

use crate::profiling::{FeatureImportance, ProfileStatistics, StyleCluster};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The profile owned by one identity (designer or shopper).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StyleProfile {
    #[serde(alias = "user_id")]
    pub identity: String,
    pub n_records: usize,
    /// Mixture components actually fitted, after clamping.
    pub n_clusters: usize,
    /// Largest first.
    pub clusters: Vec<StyleCluster>,
    pub statistics: ProfileStatistics,
    #[serde(default)]
    pub feature_importance: Vec<FeatureImportance>,
    pub version: u32,
    /// Identifies the fitted models this profile was built with.
    pub model_id: Uuid,
    /// SHA-256 of the persisted models artifact.
    pub models_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StyleProfile {
    pub fn summary_message(&self) -> String {
        format!(
            "Style profile created with {} style modes",
            self.clusters.len()
        )
    }

    pub fn describe(&self) -> String {
        let mut out = format!(
            "Profile {} (v{}): {} records across {} style modes, updated {}.",
            self.identity,
            self.version,
            self.n_records,
            self.clusters.len(),
            self.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        for cluster in &self.clusters {
            out.push_str(&format!(
                "\n- {} [{}]: {} records ({:.1}%), confidence {:.2}",
                cluster.style_name,
                cluster.id,
                cluster.size,
                cluster.percentage,
                cluster.centroid_confidence
            ));
        }
        if let Some(top) = self.feature_importance.first() {
            out.push_str(&format!(
                "\nStrongest signal: {} ({:.3}).",
                top.feature, top.importance
            ));
        }
        out
    }
}
