//! Filesystem layout of per-identity profile artifacts.
//!
//! Each identity owns one directory holding the profile JSON and the fitted
//! models JSON. Centralizing the naming here keeps the store and tools in sync.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// File name of the serialized style profile.
pub const PROFILE_FILE: &str = "profile.json";
/// File name of the serialized fitted models.
pub const MODELS_FILE: &str = "models.json";

#[derive(Debug, Clone)]
pub struct ProfileLayout {
    root: PathBuf,
}

impl ProfileLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn identity_dir(&self, identity: &str) -> PathBuf {
        self.root.join(identity_stem(identity))
    }

    pub fn profile_json(&self, identity: &str) -> PathBuf {
        self.identity_dir(identity).join(PROFILE_FILE)
    }

    pub fn models_json(&self, identity: &str) -> PathBuf {
        self.identity_dir(identity).join(MODELS_FILE)
    }
}

/// Directory name for an identity.
///
/// Lower-cased, with anything outside `[a-z0-9_-]` replaced by `-`. When that
/// rewrites the identity, a short hash of the original is appended so two
/// identities never share a directory.
pub fn identity_stem(identity: &str) -> String {
    let stem: String = identity
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if !stem.is_empty() && stem == identity {
        return stem;
    }
    let digest = Sha256::digest(identity.as_bytes());
    let suffix: String = format!("{:x}", digest).chars().take(8).collect();
    if stem.is_empty() {
        suffix
    } else {
        format!("{stem}-{suffix}")
    }
}
