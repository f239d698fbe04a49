//! Multi-label decision thresholds
//!
//! A label is flagged when its independent score reaches the threshold.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MULTI_LABEL_THRESHOLD;

/// Threshold Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Base threshold (0.0 - 1.0)
    pub base_threshold: f32,

    /// Per-label overrides
    #[serde(default)]
    pub per_label: HashMap<String, f32>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            base_threshold: DEFAULT_MULTI_LABEL_THRESHOLD,
            per_label: HashMap::new(),
        }
    }
}

impl ThresholdConfig {
    pub fn new(base: f32) -> Self {
        Self {
            base_threshold: base.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>, threshold: f32) -> Self {
        self.per_label.insert(label.into(), threshold.clamp(0.0, 1.0));
        self
    }

    /// Threshold set from a descriptor's base and per-label values.
    pub fn from_parts(base: Option<f32>, per_label: &HashMap<String, f32>) -> Self {
        per_label.iter().fold(
            base.map(Self::new).unwrap_or_default(),
            |config, (label, &threshold)| config.with_label(label.clone(), threshold),
        )
    }

    pub fn for_label(&self, label: &str) -> f32 {
        self.per_label
            .get(label)
            .copied()
            .unwrap_or(self.base_threshold)
    }

    /// Labels whose score is >= their threshold, in label order.
    pub fn flagged(&self, labels: &[String], scores: &[f32]) -> Vec<String> {
        labels
            .iter()
            .zip(scores)
            .filter(|(label, score)| **score >= self.for_label(label))
            .map(|(label, _)| label.clone())
            .collect()
    }
}
