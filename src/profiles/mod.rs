//! Persisted style profiles and the store that owns them.

mod error;
mod layout;
mod model;
pub mod storage;
mod store;

pub use error::{ProfileError, ProfileResult};
pub use layout::{identity_stem, ProfileLayout, MODELS_FILE, PROFILE_FILE};
pub use model::StyleProfile;
pub use storage::{compute_hash, read_artifact, write_artifact, ArtifactWriteOutcome};
pub use store::ProfileStore;
