//! Style profiling engine.
//!
//! Records flow through feature extraction, standardisation + projection,
//! a Gaussian mixture, and cluster characterisation. The fitted pieces are
//! kept as [`FittedModels`] so later batches can be scored without refitting.

pub mod analyze;
pub mod features;
pub mod forest;
pub mod linalg;
pub mod mixture;
pub mod naming;
pub mod reduce;
pub mod statistics;

pub use analyze::{
    analyze_clusters, dominant_attributes, refresh_clusters, DominantAttributes, DominantValue,
    RepresentativeRecord, StyleCluster,
};
pub use features::{extract_features, FeatureColumn, FeatureMatrix, Vocabulary};
pub use forest::{rank_feature_importance, FeatureImportance, ForestConfig};
pub use mixture::{Assignment, GaussianMixture, MixtureConfig};
pub use reduce::{Projection, Reducer, StandardScaler};
pub use statistics::ProfileStatistics;

use crate::records::VltRecord;
use crate::workspace::ProfilingSettings;
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Version of the persisted [`FittedModels`] layout.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Everything needed to score new records against a profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FittedModels {
    pub format_version: u32,
    pub model_id: Uuid,
    pub vocabulary: Vocabulary,
    pub reducer: Reducer,
    pub mixture: GaussianMixture,
    pub fitted_at: DateTime<Utc>,
}

impl FittedModels {
    /// Checks that the pieces agree with each other and with this build.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            bail!(
                "Unsupported model format version {} (expected {})",
                self.format_version,
                MODEL_FORMAT_VERSION
            );
        }
        let width = self.vocabulary.len();
        let scaler = &self.reducer.scaler;
        if scaler.mean.len() != width || scaler.scale.len() != width {
            bail!("Scaler width does not match vocabulary of {width} features");
        }
        let projection = &self.reducer.projection;
        if projection.mean.len() != width || projection.components.iter().any(|c| c.len() != width)
        {
            bail!("Projection width does not match vocabulary of {width} features");
        }
        let k = self.mixture.n_components();
        if k == 0 {
            bail!("Mixture has no components");
        }
        if self.mixture.means.len() != k || self.mixture.covariances.len() != k {
            bail!("Mixture parameters disagree on component count");
        }
        if self.mixture.dims() != projection.n_components() {
            bail!(
                "Mixture expects {} dimensions but projection yields {}",
                self.mixture.dims(),
                projection.n_components()
            );
        }
        Ok(())
    }
}

/// Output of a full fit over one batch.
#[derive(Debug, Clone)]
pub struct ProfilingRun {
    pub n_clusters: usize,
    pub clusters: Vec<StyleCluster>,
    pub statistics: ProfileStatistics,
    pub feature_importance: Vec<FeatureImportance>,
    pub models: FittedModels,
}

pub struct StyleProfiler {
    settings: ProfilingSettings,
}

impl StyleProfiler {
    pub fn new(settings: ProfilingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ProfilingSettings {
        &self.settings
    }

    /// Requested cluster count clamped to `[1, max(1, n_records)]`.
    pub fn effective_cluster_count(requested: usize, n_records: usize) -> usize {
        requested.clamp(1, n_records.max(1))
    }

    /// Fits every stage from scratch on `records`.
    pub fn fit(&self, records: &[VltRecord], requested_clusters: usize) -> Result<ProfilingRun> {
        if records.is_empty() {
            bail!("Cannot profile an empty batch");
        }
        let n_clusters = Self::effective_cluster_count(requested_clusters, records.len());
        if n_clusters != requested_clusters {
            warn!(
                requested = requested_clusters,
                records = records.len(),
                "Only {} records, using {} clusters",
                records.len(),
                n_clusters
            );
        }

        let (matrix, vocabulary) = extract_features(records);
        let (reducer, reduced) = Reducer::fit_transform(
            &matrix.rows,
            matrix.n_cols(),
            self.settings.max_components,
        );
        let mixture = GaussianMixture::fit(
            &reduced,
            &MixtureConfig {
                n_components: n_clusters,
                max_iterations: self.settings.max_iterations,
                tolerance: self.settings.tolerance,
                reg_covar: self.settings.reg_covar,
                seed: self.settings.random_seed,
            },
        )?;
        let assignment = mixture.assign(&reduced)?;

        let clusters = analyze_clusters(records, &assignment, self.settings.representatives);
        let statistics = ProfileStatistics::compute(records, &clusters);
        let feature_importance = rank_feature_importance(
            &matrix,
            &assignment.labels,
            &ForestConfig {
                n_trees: self.settings.forest_trees,
                seed: self.settings.random_seed,
            },
            self.settings.top_features,
        );
        info!(
            records = records.len(),
            features = matrix.n_cols(),
            dimensions = reducer.projection.n_components(),
            clusters = n_clusters,
            "Fitted style model"
        );

        Ok(ProfilingRun {
            n_clusters,
            clusters,
            statistics,
            feature_importance,
            models: FittedModels {
                format_version: MODEL_FORMAT_VERSION,
                model_id: Uuid::new_v4(),
                vocabulary,
                reducer,
                mixture,
                fitted_at: Utc::now(),
            },
        })
    }

    /// Scores `records` with previously fitted models (transform, never refit).
    pub fn score(&self, models: &FittedModels, records: &[VltRecord]) -> Result<Assignment> {
        let matrix = models.vocabulary.encode(records);
        let reduced = models.reducer.transform(&matrix.rows);
        models.mixture.assign(&reduced)
    }
}
