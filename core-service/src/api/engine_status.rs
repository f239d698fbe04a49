use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::model::AdapterStatus;

/// Health report. Cheap to build, never waits on a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub active_model: Option<String>,
    pub loaded_models: Vec<String>,
}

/// Returned by a successful switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchConfirmation {
    pub previous_model: Option<String>,
    pub current_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,

    pub active_model: Option<String>,
    pub registered_models: usize,
    pub models: Vec<AdapterStatus>,

    pub inference: InferenceStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceStats {
    pub inference_count: u64,
    pub failed_count: u64,
    pub avg_latency_ms: f64,
}
