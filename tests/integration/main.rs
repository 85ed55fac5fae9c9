use std::path::{Path, PathBuf};
use stylebase::profiles::ProfileStore;
use stylebase::workspace::ProfilingSettings;
use tempfile::TempDir;

pub struct IntegrationHarness {
    workspace: TempDir,
}

impl IntegrationHarness {
    pub fn new() -> Self {
        let workspace = TempDir::new().expect("failed to create temp workspace");
        Self { workspace }
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.workspace.path().join("profiles")
    }

    /// A fresh store over the same directory, as after a process restart.
    pub fn store(&self) -> ProfileStore {
        ProfileStore::open(self.profiles_dir(), ProfilingSettings::default())
            .expect("failed to open profile store for tests")
    }
}

mod profile_concurrency;
mod profile_create;
mod profile_persistence;
mod profile_update;
pub mod support;
