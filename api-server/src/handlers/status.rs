//! Engine status handler

use axum::{extract::State, Json};
use textclf_core::EngineStatus;

use crate::AppState;

pub async fn engine_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.service.engine_status())
}
