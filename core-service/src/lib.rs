//! Text Classification Core - model registry, adapters and inference service
//!
//! Library half of the workspace; the HTTP server in `api-server` is a thin
//! shell over [`InferenceService`].

pub mod api;
pub mod constants;
pub mod error;
pub mod logic;

pub use api::{EngineStatus, HealthStatus, InferenceService, InferenceStats, SwitchConfirmation};
pub use error::{LoadError, PredictError, RegistryError, ServiceError, SwitchError};
pub use logic::model::{
    ArtifactLoader, FsArtifactLoader, ModelDescriptor, ModelFamily, PredictedLabel,
    PredictionResult,
};
pub use logic::registry::ModelRegistry;
