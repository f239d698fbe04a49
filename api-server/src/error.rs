//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use textclf_core::{RegistryError, ServiceError, SwitchError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Model errors
    UnknownModel(String),
    ActiveModel(String),
    ModelUnavailable(String),
    NoActiveModel,

    // Validation errors
    ValidationError(String),

    // Inference errors
    Timeout(u64),
    PredictionFailed(String),

    // Generic errors
    InternalError(String),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::UnknownModel(_) => "unknown_model",
            AppError::ActiveModel(_) => "active_model",
            AppError::ModelUnavailable(_) => "load_failed",
            AppError::NoActiveModel => "no_active_model",
            AppError::ValidationError(_) => "validation",
            AppError::Timeout(_) => "timeout",
            AppError::PredictionFailed(_) => "prediction_failed",
            AppError::InternalError(_) => "internal",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            AppError::ModelUnavailable(_) | AppError::NoActiveModel | AppError::Timeout(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::UnknownModel(name) => {
                (StatusCode::NOT_FOUND, format!("Model '{}' not found", name))
            }
            AppError::ActiveModel(name) => (
                StatusCode::CONFLICT,
                format!("Model '{}' is active and cannot be unloaded", name),
            ),
            AppError::ModelUnavailable(msg) => {
                tracing::warn!("Model load failed: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            AppError::NoActiveModel => (
                StatusCode::SERVICE_UNAVAILABLE,
                "No model loaded".to_string(),
            ),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Timeout(ms) => {
                tracing::warn!("Prediction timed out after {} ms", ms);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    format!("Prediction timed out after {} ms", ms),
                )
            }
            AppError::PredictionFailed(msg) => {
                tracing::error!("Prediction failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Prediction failed: {}", msg))
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": self.kind(),
            "retryable": self.retryable(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<SwitchError> for AppError {
    fn from(err: SwitchError) -> Self {
        match err {
            SwitchError::UnknownModel(name) => AppError::UnknownModel(name),
            SwitchError::LoadFailed { identifier, cause } => AppError::ModelUnavailable(
                format!("Failed to load model '{}': {}", identifier, cause),
            ),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::PredictionFailed(cause) => AppError::PredictionFailed(cause.to_string()),
            ServiceError::Timeout(ms) => AppError::Timeout(ms),
            ServiceError::NoActiveModel => AppError::NoActiveModel,
            ServiceError::Startup(msg) => AppError::InternalError(msg),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownModel(name) => AppError::UnknownModel(name),
            RegistryError::ActiveModel(name) => AppError::ActiveModel(name),
            other => AppError::ValidationError(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("worker task failed: {}", err))
    }
}
