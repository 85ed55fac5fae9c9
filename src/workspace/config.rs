//! Configuration primitives for StyleBase.
//!
//! Stored in a machine-readable TOML file located at:
//!   $STYLEBASE_HOME/config/config.toml when the variable is set
//!   %APPDATA%/StyleBase/config/config.toml on Windows
//!   $XDG_DATA_HOME/StyleBase/config/config.toml on Linux
//!   ~/Library/Application Support/StyleBase/config/config.toml on macOS
//!
//! The config tracks the numeric knobs of the profiling engine and where
//! per-identity profile artifacts live.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// Clustering, reduction and feature-importance parameters.
    #[serde(default)]
    pub profiling: ProfilingSettings,
    /// Location of persisted profiles and fitted models.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Profiling engine tuning parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfilingSettings {
    /// Cluster count used when the caller does not request one.
    #[serde(default = "default_clusters")]
    pub default_clusters: usize,
    /// Hard cap on projected dimensions.
    #[serde(default = "default_max_components")]
    pub max_components: usize,
    /// Seed shared by mixture initialisation and the importance forest.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    /// EM iteration budget.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// EM convergence threshold on the mean log-likelihood.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Added to covariance diagonals to keep them positive definite.
    #[serde(default = "default_reg_covar")]
    pub reg_covar: f64,
    /// Trees in the feature-importance forest.
    #[serde(default = "default_forest_trees")]
    pub forest_trees: usize,
    /// Length of the feature-importance ranking kept on a profile.
    #[serde(default = "default_top_features")]
    pub top_features: usize,
    /// Representative records kept per cluster.
    #[serde(default = "default_representatives")]
    pub representatives: usize,
}

impl Default for ProfilingSettings {
    fn default() -> Self {
        Self {
            default_clusters: default_clusters(),
            max_components: default_max_components(),
            random_seed: default_random_seed(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            reg_covar: default_reg_covar(),
            forest_trees: default_forest_trees(),
            top_features: default_top_features(),
            representatives: default_representatives(),
        }
    }
}

const fn default_clusters() -> usize {
    5
}

const fn default_max_components() -> usize {
    10
}

const fn default_random_seed() -> u64 {
    42
}

const fn default_max_iterations() -> usize {
    100
}

const fn default_tolerance() -> f64 {
    1e-3
}

const fn default_reg_covar() -> f64 {
    1e-6
}

const fn default_forest_trees() -> usize {
    50
}

const fn default_top_features() -> usize {
    10
}

const fn default_representatives() -> usize {
    3
}

/// Storage overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StorageSettings {
    /// Directory holding one sub-directory per identity. Defaults to
    /// `<workspace root>/profiles`.
    #[serde(default)]
    pub profiles_dir: Option<PathBuf>,
}

/// Standard relative path to the config file (resolved per OS at runtime).
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable overriding the workspace root.
pub const HOME_ENV_VAR: &str = "STYLEBASE_HOME";

use anyhow::{Context, Result};
use directories::BaseDirs;
use std::env;
use std::fs;

/// Returns the root directory where StyleBase stores data.
///
/// Order of precedence:
/// 1. `STYLEBASE_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(path) = env::var(HOME_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS data directory")?;
    Ok(base_dirs.data_dir().join("StyleBase"))
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(workspace_root()?.join("config"))
}

/// Path to the config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from disk or returns defaults.
pub fn load_or_default() -> Result<AppConfig> {
    let path = config_file_path()?;
    if path.exists() {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        parse_config(&data).with_context(|| format!("Failed to parse config file {:?}", path))
    } else {
        Ok(AppConfig::default())
    }
}

pub fn parse_config(data: &str) -> Result<AppConfig> {
    Ok(toml::from_str(data)?)
}

/// Persists the configuration to disk.
pub fn save(config: &AppConfig) -> Result<()> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    let path = config_file_path()?;
    let data = toml::to_string_pretty(config)?;
    fs::write(&path, data)?;
    Ok(())
}

/// Directory holding per-identity profile artifacts.
pub fn profiles_dir(config: &AppConfig) -> Result<PathBuf> {
    match &config.storage.profiles_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(workspace_root()?.join("profiles")),
    }
}
