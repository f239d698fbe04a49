//! Model listing, switching and eviction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::models::{EvictResponse, ModelInfo, ModelsResponse, SwitchRequest, SwitchResponse};
use crate::{AppError, AppResult, AppState};

pub async fn list(State(state): State<AppState>) -> Json<ModelsResponse> {
    let registry = state.service.registry();
    let active = registry.active_identifier();

    let available_models = state
        .service
        .list_models()
        .iter()
        .map(|d| {
            let is_active = active.as_deref() == Some(d.identifier.as_str());
            ModelInfo::from_descriptor(d, registry.is_loaded(&d.identifier), is_active)
        })
        .collect();

    Json(ModelsResponse {
        current_model: active,
        available_models,
    })
}

/// Loads the target if needed; the previous model keeps serving until the
/// switch commits.
pub async fn switch(
    State(state): State<AppState>,
    Json(req): Json<SwitchRequest>,
) -> AppResult<Json<SwitchResponse>> {
    let name = req.model_name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::ValidationError("model_name must not be empty".to_string()));
    }

    let service = Arc::clone(&state.service);
    let target = name.clone();
    let confirmation = tokio::task::spawn_blocking(move || service.switch_model(&target)).await??;

    let descriptor = state
        .service
        .registry()
        .descriptor(&confirmation.current_model)
        .ok_or_else(|| AppError::UnknownModel(name.clone()))?;

    tracing::info!(
        "Switched model: {} -> {}",
        confirmation.previous_model.as_deref().unwrap_or("<none>"),
        confirmation.current_model
    );

    Ok(Json(SwitchResponse {
        message: format!("Switched to model '{}'", confirmation.current_model),
        previous_model: confirmation.previous_model,
        current_model: confirmation.current_model,
        family: descriptor.family.to_string(),
        num_classes: descriptor.labels.len(),
    }))
}

pub async fn evict(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<EvictResponse>> {
    let service = Arc::clone(&state.service);
    let target = name.clone();
    let was_loaded = tokio::task::spawn_blocking(move || service.evict_model(&target)).await??;

    let message = if was_loaded {
        format!("Model '{}' unloaded", name)
    } else {
        format!("Model '{}' was not loaded", name)
    };
    Ok(Json(EvictResponse {
        message,
        model: name,
        was_loaded,
    }))
}
