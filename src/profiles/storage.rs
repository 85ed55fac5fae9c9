//! Filesystem helpers for reading/writing profile and model artifacts.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result returned after writing an artifact.
#[derive(Debug, Clone)]
pub struct ArtifactWriteOutcome {
    pub path: PathBuf,
    pub hash: String,
}

/// Loads a JSON artifact if it exists.
pub fn read_artifact<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Option<T>> {
    let path = path.as_ref();
    let Some(data) = read_artifact_bytes(path)? else {
        return Ok(None);
    };
    let value = serde_json::from_slice(&data)
        .with_context(|| format!("Failed parsing artifact {:?}", path))?;
    Ok(Some(value))
}

/// Raw bytes of an artifact, `None` when the file does not exist.
pub fn read_artifact_bytes<P: AsRef<Path>>(path: P) -> Result<Option<Vec<u8>>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).with_context(|| format!("Failed reading artifact {:?}", path))?;
    Ok(Some(data))
}

/// Writes a pretty JSON artifact in full and returns its hash.
///
/// The payload goes to a sibling temp file first and is renamed over the
/// target, so readers see either the old or the new artifact.
pub fn write_artifact<T: Serialize, P: AsRef<Path>>(
    path: P,
    value: &T,
) -> Result<ArtifactWriteOutcome> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating artifact directory {:?}", parent))?;
    }
    let payload = serde_json::to_vec_pretty(value)
        .with_context(|| format!("Failed serializing artifact {:?}", path))?;
    let hash = compute_hash(&payload);
    let staging = path.with_extension("json.tmp");
    let mut file = fs::File::create(&staging)
        .with_context(|| format!("Failed opening artifact {:?}", staging))?;
    file.write_all(&payload)?;
    file.sync_all()?;
    fs::rename(&staging, path)
        .with_context(|| format!("Failed replacing artifact {:?}", path))?;
    Ok(ArtifactWriteOutcome {
        path: path.to_path_buf(),
        hash,
    })
}

/// Computes a lowercase hex SHA-256 hash of the provided bytes.
pub fn compute_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}", digest)
}
