//! Error taxonomy for loading, prediction, registry and service operations.

use thiserror::Error;

/// Failure to bring a model artifact into memory.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("artifact not found: {0}")]
    ArtifactMissing(String),

    #[error("artifact corrupt ({location}): {reason}")]
    Corrupt { location: String, reason: String },

    #[error("load of '{0}' cancelled: registry shut down")]
    Cancelled(String),
}

impl LoadError {
    pub fn corrupt(location: impl Into<String>, reason: impl ToString) -> Self {
        LoadError::Corrupt {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("model '{0}' is not loaded")]
    NotLoaded(String),

    #[error("inference failed: {0}")]
    InferenceFailure(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwitchError {
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("failed to load model '{identifier}'")]
    LoadFailed {
        identifier: String,
        #[source]
        cause: LoadError,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("model identifier already registered: {0}")]
    DuplicateIdentifier(String),

    #[error("invalid descriptor '{identifier}': {reason}")]
    InvalidDescriptor { identifier: String, reason: String },

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("model '{0}' is active and cannot be evicted")]
    ActiveModel(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("prediction failed: {0}")]
    PredictionFailed(#[from] PredictError),

    #[error("prediction timed out after {0} ms")]
    Timeout(u64),

    #[error("no active model")]
    NoActiveModel,

    #[error("startup failed: {0}")]
    Startup(String),
}

impl ServiceError {
    /// Whether the caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Timeout(_) | ServiceError::NoActiveModel)
    }
}

impl SwitchError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SwitchError::LoadFailed { cause, .. } if !matches!(cause, LoadError::Cancelled(_))
        )
    }
}
