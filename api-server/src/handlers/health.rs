//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    current_model: Option<String>,
    available_models: Vec<String>,
    loaded_models: Vec<String>,
    num_classes: Option<usize>,
    classes: Option<Vec<String>>,
    version: &'static str,
    timestamp: i64,
}

/// Never waits on a model load.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state.service.health();
    let registry = state.service.registry();

    let classes = health
        .active_model
        .as_deref()
        .and_then(|id| registry.descriptor(id))
        .map(|d| d.labels.clone());

    Json(HealthResponse {
        status: if health.ok { "ok" } else { "model_not_loaded" },
        model_loaded: health.ok,
        current_model: health.active_model,
        available_models: registry
            .descriptors()
            .iter()
            .map(|d| d.identifier.clone())
            .collect(),
        loaded_models: health.loaded_models,
        num_classes: classes.as_ref().map(Vec::len),
        classes,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Text Classification API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "models": "/models",
            "switch": "/models/switch",
            "predict": "/predict",
            "predict_batch": "/predict/batch",
            "status": "/status"
        },
        "model": state.service.registry().active_identifier(),
        "status": "running"
    }))
}
