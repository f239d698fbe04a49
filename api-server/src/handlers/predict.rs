//! Prediction handlers

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};

use crate::models::{
    BatchItem, BatchPredictRequest, BatchPredictResponse, PredictRequest, PredictResponse,
};
use crate::{AppError, AppResult, AppState};
use super::run_blocking;

/// Trim and bound a text; whitespace-only input is rejected.
fn validate_text(text: &str, max_length: usize) -> AppResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::ValidationError(
            "Text must not be empty or just whitespace".to_string(),
        ));
    }
    let length = text.chars().count();
    if length > max_length {
        return Err(AppError::ValidationError(format!(
            "Text is {} characters, limit is {}",
            length, max_length
        )));
    }
    Ok(text.to_string())
}

pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    let text = validate_text(&req.text, state.config.max_text_length)?;

    let service = Arc::clone(&state.service);
    let result = run_blocking(state.config.predict_timeout_ms, move || service.predict(&text))
        .await??;

    tracing::debug!(
        "Predicted '{:?}' with {} in {:.2} ms",
        result.predicted_label,
        result.model_identifier,
        result.inference_duration_ms
    );
    Ok(Json(result.into()))
}

/// Whole batch runs against one model; per-item failures are reported inline.
pub async fn predict_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchPredictRequest>,
) -> AppResult<Json<BatchPredictResponse>> {
    if req.texts.is_empty() {
        return Err(AppError::ValidationError("texts must not be empty".to_string()));
    }
    if req.texts.len() > state.config.max_batch_size {
        return Err(AppError::ValidationError(format!(
            "Batch has {} texts, limit is {}",
            req.texts.len(),
            state.config.max_batch_size
        )));
    }

    let texts = req
        .texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            validate_text(text, state.config.max_text_length).map_err(|e| match e {
                AppError::ValidationError(msg) => {
                    AppError::ValidationError(format!("texts[{}]: {}", i, msg))
                }
                other => other,
            })
        })
        .collect::<AppResult<Vec<String>>>()?;

    let started = Instant::now();
    let service = Arc::clone(&state.service);
    let outcomes = run_blocking(state.config.predict_timeout_ms, move || {
        service.predict_batch(&texts)
    })
    .await??;

    let mut model = None;
    let results = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            Ok(result) => {
                model.get_or_insert_with(|| result.model_identifier.clone());
                BatchItem::Ok(result.into())
            }
            Err(e) => BatchItem::Err { error: e.to_string() },
        })
        .collect();

    Ok(Json(BatchPredictResponse {
        model,
        results,
        total_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    }))
}
