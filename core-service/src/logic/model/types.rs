//! Model descriptors and prediction output.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_LENGTH;

// ============================================================================
// DESCRIPTOR
// ============================================================================

/// Model family, selects the artifact format and the output head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelFamily {
    /// TF-IDF vectorizer + linear classifier
    BaselineLinear,
    /// Transformer with softmax head
    TransformerSingleLabel,
    /// Transformer with independent sigmoid per label
    TransformerMultiLabel,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::BaselineLinear => "baseline-linear",
            ModelFamily::TransformerSingleLabel => "transformer-single-label",
            ModelFamily::TransformerMultiLabel => "transformer-multi-label",
        }
    }

    pub fn is_multi_label(&self) -> bool {
        matches!(self, ModelFamily::TransformerMultiLabel)
    }

    pub fn is_transformer(&self) -> bool {
        !matches!(self, ModelFamily::BaselineLinear)
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static metadata about an available model. Immutable after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub identifier: String,
    pub family: ModelFamily,
    pub artifact_location: PathBuf,
    pub labels: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Hex SHA-256 of the artifact file (linear bundle or `model.onnx`)
    #[serde(default)]
    pub sha256: Option<String>,

    /// Tokenizer truncation length for transformer families
    #[serde(default)]
    pub max_length: Option<usize>,

    /// Multi-label decision threshold override
    #[serde(default)]
    pub threshold: Option<f32>,

    /// Per-label thresholds, taking precedence over `threshold`
    #[serde(default)]
    pub label_thresholds: HashMap<String, f32>,
}

impl ModelDescriptor {
    pub fn new(
        identifier: impl Into<String>,
        family: ModelFamily,
        artifact_location: impl Into<PathBuf>,
        labels: Vec<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            family,
            artifact_location: artifact_location.into(),
            labels,
            description: None,
            sha256: None,
            max_length: None,
            threshold: None,
            label_thresholds: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_label_threshold(mut self, label: impl Into<String>, threshold: f32) -> Self {
        self.label_thresholds.insert(label.into(), threshold);
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }

    pub fn effective_max_length(&self) -> usize {
        self.max_length.unwrap_or(DEFAULT_MAX_LENGTH)
    }

    pub fn location_display(&self) -> String {
        self.artifact_location.display().to_string()
    }
}

// ============================================================================
// PREDICTION OUTPUT
// ============================================================================

/// Decision derived from the scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictedLabel {
    /// argmax label (single-label families)
    Single(String),
    /// labels at or above threshold (multi-label family), may be empty
    Multi(Vec<String>),
}

impl PredictedLabel {
    /// Labels carried by this decision, as a slice-like list.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            PredictedLabel::Single(label) => vec![label.as_str()],
            PredictedLabel::Multi(labels) => labels.iter().map(String::as_str).collect(),
        }
    }
}

/// Output of one prediction. Created fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
    pub predicted_label: PredictedLabel,
    pub inference_duration_ms: f64,
    pub model_identifier: String,
}

impl PredictionResult {
    /// Highest score across labels (0.0 when there are no labels).
    pub fn confidence(&self) -> f32 {
        self.scores.iter().copied().fold(0.0, f32::max)
    }

    /// (label, score) pairs, highest score first; ties keep label order.
    pub fn ranked(&self) -> Vec<(&str, f32)> {
        let mut pairs: Vec<(&str, f32)> = self
            .labels
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        pairs
    }

    pub fn score_of(&self, label: &str) -> Option<f32> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.scores.get(i).copied())
    }
}
