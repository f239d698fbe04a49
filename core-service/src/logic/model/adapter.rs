//! Model Adapter - uniform predict contract over every model family.
//!
//! The adapter owns its backend exclusively. `predict` holds a read lock on
//! the backend slot while the backend runs, so `unload` waits for in-flight
//! predictions and later calls see `NotLoaded`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, PredictError};
use super::head::{argmax, scores_for};
use super::loader::{ArtifactLoader, Scorer};
use super::threshold::ThresholdConfig;
use super::types::{ModelDescriptor, PredictedLabel, PredictionResult};

struct Loaded {
    scorer: Box<dyn Scorer>,
    loaded_at: DateTime<Utc>,
}

/// Adapter status for UI / health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterStatus {
    pub identifier: String,
    pub family: String,
    pub loaded: bool,
    pub backend: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub prediction_count: u64,
}

pub struct ModelAdapter {
    descriptor: Arc<ModelDescriptor>,
    loader: Arc<dyn ArtifactLoader>,
    thresholds: ThresholdConfig,
    backend: RwLock<Option<Loaded>>,
    predictions: AtomicU64,
}

impl std::fmt::Debug for ModelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("identifier", &self.descriptor.identifier)
            .field("family", &self.descriptor.family)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ModelAdapter {
    pub fn new(descriptor: Arc<ModelDescriptor>, loader: Arc<dyn ArtifactLoader>) -> Self {
        let thresholds =
            ThresholdConfig::from_parts(descriptor.threshold, &descriptor.label_thresholds);
        Self {
            descriptor,
            loader,
            thresholds,
            backend: RwLock::new(None),
            predictions: AtomicU64::new(0),
        }
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn identifier(&self) -> &str {
        &self.descriptor.identifier
    }

    pub fn labels(&self) -> &[String] {
        &self.descriptor.labels
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.read().is_some()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.backend.read().as_ref().map(|l| l.loaded_at)
    }

    /// Bring the artifact into memory. No-op when already loaded.
    pub fn load(&self) -> Result<(), LoadError> {
        if self.is_loaded() {
            return Ok(());
        }

        let mut slot = self.backend.write();
        if slot.is_some() {
            return Ok(());
        }

        let started = Instant::now();
        let scorer = panic::catch_unwind(AssertUnwindSafe(|| self.loader.load(&self.descriptor)))
            .map_err(|_| {
                log::error!("Loader panicked on model '{}'", self.descriptor.identifier);
                LoadError::corrupt(self.descriptor.location_display(), "loader panicked")
            })??;
        self.check_output_width(scorer.as_ref())?;

        log::info!(
            "Model '{}' ({}) loaded in {:.1} ms",
            self.descriptor.identifier,
            self.descriptor.family,
            started.elapsed().as_secs_f64() * 1000.0
        );
        *slot = Some(Loaded {
            scorer,
            loaded_at: Utc::now(),
        });
        Ok(())
    }

    fn check_output_width(&self, scorer: &dyn Scorer) -> Result<(), LoadError> {
        let Some(width) = scorer.output_count() else {
            return Ok(());
        };
        let labels = self.descriptor.labels.len();
        // two-class linear models emit a single positive-class column
        let binary_linear = width == 1 && labels == 2 && !self.descriptor.family.is_transformer();
        if width != labels && !binary_linear {
            return Err(LoadError::corrupt(
                self.descriptor.location_display(),
                format!("artifact has {} outputs but descriptor lists {} labels", width, labels),
            ));
        }
        Ok(())
    }

    /// Release the artifact; waits for in-flight predictions on this adapter.
    pub fn unload(&self) {
        if self.backend.write().take().is_some() {
            log::info!("Model '{}' unloaded", self.descriptor.identifier);
        }
    }

    pub fn predict(&self, text: &str) -> Result<PredictionResult, PredictError> {
        let started = Instant::now();

        let slot = self.backend.read();
        let loaded = slot
            .as_ref()
            .ok_or_else(|| PredictError::NotLoaded(self.descriptor.identifier.clone()))?;

        let raw = loaded.scorer.decision(text)?;
        drop(slot);

        if let Some(bad) = raw.iter().find(|v| !v.is_finite()) {
            return Err(PredictError::InferenceFailure(format!(
                "model produced a non-finite output ({})",
                bad
            )));
        }

        let labels = &self.descriptor.labels;
        let scores = scores_for(self.descriptor.family, &raw, labels.len()).ok_or_else(|| {
            PredictError::InferenceFailure(format!(
                "model produced {} outputs for {} labels",
                raw.len(),
                labels.len()
            ))
        })?;

        let predicted_label = if self.descriptor.family.is_multi_label() {
            PredictedLabel::Multi(self.thresholds.flagged(labels, &scores))
        } else {
            let index = argmax(&scores).ok_or_else(|| {
                PredictError::InferenceFailure("no finite score to rank".to_string())
            })?;
            PredictedLabel::Single(labels[index].clone())
        };

        self.predictions.fetch_add(1, Ordering::Relaxed);

        Ok(PredictionResult {
            labels: labels.clone(),
            scores,
            predicted_label,
            inference_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            model_identifier: self.descriptor.identifier.clone(),
        })
    }

    pub fn status(&self) -> AdapterStatus {
        let slot = self.backend.read();
        AdapterStatus {
            identifier: self.descriptor.identifier.clone(),
            family: self.descriptor.family.to_string(),
            loaded: slot.is_some(),
            backend: slot.as_ref().map(|l| l.scorer.backend().to_string()),
            loaded_at: slot.as_ref().map(|l| l.loaded_at),
            prediction_count: self.predictions.load(Ordering::Relaxed),
        }
    }
}
