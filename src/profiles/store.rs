use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::profiling::{refresh_clusters, FittedModels, StyleProfiler};
use crate::records::VltRecord;
use crate::workspace::{profiles_dir, AppConfig, ProfilingSettings};

use super::error::{ProfileError, ProfileResult};
use super::layout::ProfileLayout;
use super::model::StyleProfile;
use super::storage::{compute_hash, read_artifact, read_artifact_bytes, write_artifact};

/// Owns every identity's profile and fitted models.
///
/// Calls for one identity are serialised by a per-identity lock; different
/// identities proceed independently. Reads go through an in-memory cache that
/// is written through on every successful create/update. Both maps hold one
/// entry per identity touched since the last [`ProfileStore::evict`] for it.
pub struct ProfileStore {
    layout: ProfileLayout,
    profiler: StyleProfiler,
    cache: Mutex<HashMap<String, StyleProfile>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProfileStore {
    pub fn open(root: impl Into<PathBuf>, settings: ProfilingSettings) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed creating profiles directory {:?}", root))?;
        Ok(Self {
            layout: ProfileLayout::new(root),
            profiler: StyleProfiler::new(settings),
            cache: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::open(profiles_dir(config)?, config.profiling.clone())
    }

    pub fn layout(&self) -> &ProfileLayout {
        &self.layout
    }

    pub fn settings(&self) -> &ProfilingSettings {
        self.profiler.settings()
    }

    /// Fits a fresh profile for `identity`, replacing any previous one.
    ///
    /// `requested_clusters` defaults to the configured cluster count and is
    /// clamped to the number of records.
    pub fn create(
        &self,
        identity: &str,
        records: &[VltRecord],
        requested_clusters: Option<usize>,
    ) -> ProfileResult<StyleProfile> {
        if records.is_empty() {
            return Err(ProfileError::InsufficientData);
        }
        let lock = self.identity_lock(identity);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let requested = requested_clusters.unwrap_or(self.settings().default_clusters);
        info!(
            "Creating style profile for {identity} with {} records",
            records.len()
        );
        let run = self.profiler.fit(records, requested)?;

        let models_outcome = write_artifact(self.layout.models_json(identity), &run.models)?;
        let now = Utc::now();
        let profile = StyleProfile {
            identity: identity.to_string(),
            n_records: records.len(),
            n_clusters: run.n_clusters,
            clusters: run.clusters,
            statistics: run.statistics,
            feature_importance: run.feature_importance,
            version: 1,
            model_id: run.models.model_id,
            models_hash: models_outcome.hash,
            created_at: now,
            updated_at: now,
        };
        write_artifact(self.layout.profile_json(identity), &profile)?;
        self.cache_put(&profile);
        info!(
            "Style profile created for {identity} with {} clusters",
            profile.n_clusters
        );
        Ok(profile)
    }

    /// Scores `new_records` with the stored models and folds them into the
    /// existing profile. An empty batch returns the profile unchanged.
    pub fn update(&self, identity: &str, new_records: &[VltRecord]) -> ProfileResult<StyleProfile> {
        let lock = self.identity_lock(identity);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut profile = self
            .load(identity)?
            .ok_or_else(|| ProfileError::ProfileNotFound(identity.to_string()))?;
        if new_records.is_empty() {
            debug!("Empty update batch for {identity}; profile unchanged");
            return Ok(profile);
        }
        info!(
            "Updating style profile for {identity} with {} new records",
            new_records.len()
        );
        let models = self.load_models(identity, &profile)?;
        let assignment = self.profiler.score(&models, new_records)?;

        let total = profile.n_records + new_records.len();
        refresh_clusters(
            &mut profile.clusters,
            new_records,
            &assignment,
            self.settings().representatives,
            total,
        );
        profile.n_records = total;
        profile.statistics.absorb(new_records);
        profile
            .statistics
            .refresh_cluster_metrics(&profile.clusters, profile.n_records);
        profile.version += 1;
        profile.updated_at = Utc::now();

        let models_outcome = write_artifact(self.layout.models_json(identity), &models)?;
        profile.models_hash = models_outcome.hash;
        write_artifact(self.layout.profile_json(identity), &profile)?;
        self.cache_put(&profile);
        info!(
            "Profile updated, now with {} total records",
            profile.n_records
        );
        Ok(profile)
    }

    /// Cached profile, else the persisted one, else `None`.
    pub fn get(&self, identity: &str) -> ProfileResult<Option<StyleProfile>> {
        let lock = self.identity_lock(identity);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load(identity)
    }

    /// Like [`ProfileStore::get`] but treats absence as an error.
    pub fn require(&self, identity: &str) -> ProfileResult<StyleProfile> {
        self.get(identity)?
            .ok_or_else(|| ProfileError::ProfileNotFound(identity.to_string()))
    }

    /// Drops the cached copy so the next read goes to disk, and the identity's
    /// lock entry when no call currently holds it.
    pub fn evict(&self, identity: &str) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identity);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(identity)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(identity);
        }
    }

    fn load(&self, identity: &str) -> ProfileResult<Option<StyleProfile>> {
        if let Some(profile) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
        {
            return Ok(Some(profile.clone()));
        }
        let path = self.layout.profile_json(identity);
        let Some(profile) = read_artifact::<StyleProfile, _>(&path)? else {
            return Ok(None);
        };
        if profile.identity != identity {
            warn!(
                "Profile at {:?} belongs to '{}', not '{identity}'",
                path, profile.identity
            );
            return Ok(None);
        }
        debug!("Loaded style profile for {identity} from disk");
        self.cache_put(&profile);
        Ok(Some(profile))
    }

    fn load_models(&self, identity: &str, profile: &StyleProfile) -> ProfileResult<FittedModels> {
        let path = self.layout.models_json(identity);
        let bytes = read_artifact_bytes(&path)
            .map_err(|err| ProfileError::model_load(identity, format!("{err:#}")))?
            .ok_or_else(|| ProfileError::model_load(identity, "models artifact is missing"))?;
        if compute_hash(&bytes) != profile.models_hash {
            return Err(ProfileError::model_load(
                identity,
                "models artifact does not match the hash recorded on the profile",
            ));
        }
        let models: FittedModels = serde_json::from_slice(&bytes)
            .map_err(|err| ProfileError::model_load(identity, err.to_string()))?;
        models
            .validate()
            .map_err(|err| ProfileError::model_load(identity, format!("{err:#}")))?;
        if models.model_id != profile.model_id {
            return Err(ProfileError::model_load(
                identity,
                format!(
                    "models {} do not belong to profile built with {}",
                    models.model_id, profile.model_id
                ),
            ));
        }
        Ok(models)
    }

    fn cache_put(&self, profile: &StyleProfile) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.identity.clone(), profile.clone());
    }

    fn identity_lock(&self, identity: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(identity.to_string())
            .or_default()
            .clone()
    }
}
