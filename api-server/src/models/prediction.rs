//! Prediction request / response bodies

use serde::{Deserialize, Serialize};
use textclf_core::{PredictedLabel, PredictionResult};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchPredictRequest {
    pub texts: Vec<String>,
}

/// Individual class score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// argmax label; for multi-label models the highest-scoring label
    pub predicted_label: String,
    pub confidence: f32,
    /// Highest score first
    pub scores: Vec<ClassScore>,
    pub inference_time_ms: f64,
    pub model: String,
    /// Labels at or above threshold (multi-label models only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged_labels: Option<Vec<String>>,
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        let scores: Vec<ClassScore> = result
            .ranked()
            .into_iter()
            .map(|(label, score)| ClassScore {
                label: label.to_string(),
                score,
            })
            .collect();

        let confidence = result.confidence();

        let (predicted_label, flagged_labels) = match result.predicted_label {
            PredictedLabel::Single(label) => (label, None),
            PredictedLabel::Multi(flagged) => {
                let top = scores.first().map(|s| s.label.clone()).unwrap_or_default();
                (top, Some(flagged))
            }
        };

        Self {
            predicted_label,
            confidence,
            scores,
            inference_time_ms: result.inference_duration_ms,
            model: result.model_identifier,
            flagged_labels,
        }
    }
}

/// One batch entry: a prediction or the error that replaced it
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Ok(PredictResponse),
    Err { error: String },
}

#[derive(Debug, Serialize)]
pub struct BatchPredictResponse {
    pub model: Option<String>,
    pub results: Vec<BatchItem>,
    pub total_time_ms: f64,
}
