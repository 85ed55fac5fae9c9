use thiserror::Error;

/// Failures surfaced by the profile store.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("At least one record is required to build a style profile")]
    InsufficientData,

    #[error("Style profile not found for '{0}'")]
    ProfileNotFound(String),

    #[error("Fitted models for '{identity}' could not be loaded: {reason}")]
    ModelLoadFailure { identity: String, reason: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProfileError {
    /// HTTP-equivalent status for the service boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            ProfileError::InsufficientData => 400,
            ProfileError::ProfileNotFound(_) => 404,
            ProfileError::ModelLoadFailure { .. } | ProfileError::Internal(_) => 500,
        }
    }

    pub(crate) fn model_load(identity: &str, reason: impl Into<String>) -> Self {
        ProfileError::ModelLoadFailure {
            identity: identity.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ProfileResult<T> = std::result::Result<T, ProfileError>;
