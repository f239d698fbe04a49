//! Inference Service - public operations over the model registry.
//!
//! No retries happen here: a failed prediction or switch is reported to the
//! caller as-is.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::constants::CORE_VERSION;
use crate::error::{RegistryError, ServiceError, SwitchError};
use crate::logic::model::{ArtifactLoader, ModelDescriptor, PredictionResult};
use crate::logic::registry::ModelRegistry;
use super::engine_status::{EngineStatus, HealthStatus, InferenceStats, SwitchConfirmation};

pub struct InferenceService {
    registry: Arc<ModelRegistry>,
    started_at: DateTime<Utc>,
    inference_count: AtomicU64,
    failed_count: AtomicU64,
    /// Summed latency in microseconds
    latency_sum_us: AtomicU64,
}

impl InferenceService {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            started_at: Utc::now(),
            inference_count: AtomicU64::new(0),
            failed_count: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
        }
    }

    /// Register every descriptor and activate `default_model` (or the first
    /// descriptor). Fails fast on anything that would leave the service
    /// without a model to serve.
    pub fn bootstrap(
        descriptors: Vec<ModelDescriptor>,
        default_model: Option<&str>,
        loader: Arc<dyn ArtifactLoader>,
    ) -> Result<Self, ServiceError> {
        if descriptors.is_empty() {
            return Err(ServiceError::Startup("no model descriptors configured".to_string()));
        }

        let registry = Arc::new(ModelRegistry::new(loader));
        for descriptor in descriptors {
            registry
                .register(descriptor)
                .map_err(|e| ServiceError::Startup(e.to_string()))?;
        }

        let default = match default_model {
            Some(id) => id.to_string(),
            None => registry
                .descriptors()
                .first()
                .map(|d| d.identifier.clone())
                .ok_or_else(|| ServiceError::Startup("no model descriptors configured".into()))?,
        };

        registry.switch_active(&default).map_err(|e| match e {
            SwitchError::UnknownModel(id) => {
                ServiceError::Startup(format!("default model '{}' is not registered", id))
            }
            SwitchError::LoadFailed { identifier, cause } => ServiceError::Startup(format!(
                "default model '{}' failed to load: {}",
                identifier, cause
            )),
        })?;

        log::info!(
            "Inference service ready: {} models registered, active '{}'",
            registry.len(),
            default
        );
        Ok(Self::new(registry))
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    // ------------------------------------------------------------------------
    // Prediction
    // ------------------------------------------------------------------------

    pub fn predict(&self, text: &str) -> Result<PredictionResult, ServiceError> {
        let adapter = self.registry.get_active().ok_or(ServiceError::NoActiveModel)?;
        let outcome = adapter.predict(text);
        self.record(&outcome);
        outcome.map_err(|e| {
            log::warn!("Prediction with '{}' failed: {}", adapter.identifier(), e);
            ServiceError::PredictionFailed(e)
        })
    }

    /// Predict every text against one snapshot of the active model, so a
    /// concurrent switch never mixes models within a batch.
    pub fn predict_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<Result<PredictionResult, ServiceError>>, ServiceError> {
        let adapter = self.registry.get_active().ok_or(ServiceError::NoActiveModel)?;
        Ok(texts
            .iter()
            .map(|text| {
                let outcome = adapter.predict(text);
                self.record(&outcome);
                outcome.map_err(ServiceError::PredictionFailed)
            })
            .collect())
    }

    fn record<E>(&self, outcome: &Result<PredictionResult, E>) {
        match outcome {
            Ok(result) => {
                self.inference_count.fetch_add(1, Ordering::Relaxed);
                let micros = (result.inference_duration_ms * 1000.0).max(0.0) as u64;
                self.latency_sum_us.fetch_add(micros, Ordering::Relaxed);
            }
            Err(_) => {
                self.failed_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Models
    // ------------------------------------------------------------------------

    /// Registered descriptors in registration order.
    pub fn list_models(&self) -> Vec<ModelDescriptor> {
        self.registry
            .descriptors()
            .iter()
            .map(|d| ModelDescriptor::clone(d))
            .collect()
    }

    pub fn switch_model(&self, identifier: &str) -> Result<SwitchConfirmation, SwitchError> {
        let previous_model = self.registry.switch_active(identifier)?;
        Ok(SwitchConfirmation {
            previous_model,
            current_model: identifier.to_string(),
        })
    }

    pub fn evict_model(&self, identifier: &str) -> Result<bool, RegistryError> {
        self.registry.evict(identifier)
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    pub fn health(&self) -> HealthStatus {
        let active_model = self.registry.active_identifier();
        if active_model.is_none() {
            log::warn!("Health check: no active model");
        }
        HealthStatus {
            ok: active_model.is_some(),
            active_model,
            loaded_models: self.registry.loaded_identifiers(),
        }
    }

    pub fn stats(&self) -> InferenceStats {
        let count = self.inference_count.load(Ordering::Relaxed);
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let avg = if count > 0 {
            (sum as f64 / count as f64) / 1000.0
        } else {
            0.0
        };
        InferenceStats {
            inference_count: count,
            failed_count: self.failed_count.load(Ordering::Relaxed),
            avg_latency_ms: avg,
        }
    }

    pub fn engine_status(&self) -> EngineStatus {
        let now = Utc::now();
        EngineStatus {
            version: CORE_VERSION.to_string(),
            started_at: self.started_at,
            uptime_secs: (now - self.started_at).num_seconds(),
            active_model: self.registry.active_identifier(),
            registered_models: self.registry.len(),
            models: self
                .registry
                .loaded_adapters()
                .iter()
                .map(|a| a.status())
                .collect(),
            inference: self.stats(),
        }
    }

    pub fn shutdown(&self) {
        self.registry.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LoadError, PredictError};
    use crate::logic::model::{ModelFamily, PredictedLabel, Scorer};

    /// Positive logit grows with the number of words containing "great".
    struct KeywordScorer;

    impl Scorer for KeywordScorer {
        fn decision(&self, text: &str) -> Result<Vec<f32>, PredictError> {
            let hits = text.split_whitespace().filter(|w| w.contains("great")).count() as f32;
            Ok(vec![0.0, hits])
        }

        fn backend(&self) -> &'static str {
            "keyword"
        }
    }

    struct ToxicScorer;

    impl Scorer for ToxicScorer {
        fn decision(&self, text: &str) -> Result<Vec<f32>, PredictError> {
            let toxic = if text.contains("idiot") { 4.0 } else { -4.0 };
            Ok(vec![toxic, -4.0, toxic])
        }

        fn backend(&self) -> &'static str {
            "toxic"
        }
    }

    struct TestLoader;

    impl ArtifactLoader for TestLoader {
        fn load(&self, descriptor: &ModelDescriptor) -> Result<Box<dyn Scorer>, LoadError> {
            match descriptor.identifier.as_str() {
                "broken" => Err(LoadError::ArtifactMissing(descriptor.location_display())),
                "toxicity" => Ok(Box::new(ToxicScorer)),
                _ => Ok(Box::new(KeywordScorer)),
            }
        }
    }

    fn binary(id: &str, family: ModelFamily) -> ModelDescriptor {
        ModelDescriptor::new(id, family, format!("models/{}", id), vec!["neg".into(), "pos".into()])
    }

    fn service() -> InferenceService {
        InferenceService::bootstrap(
            vec![
                binary("fast", ModelFamily::BaselineLinear),
                binary("accurate", ModelFamily::TransformerSingleLabel),
                ModelDescriptor::new(
                    "toxicity",
                    ModelFamily::TransformerMultiLabel,
                    "models/toxicity",
                    vec!["toxic".into(), "threat".into(), "insult".into()],
                ),
                binary("broken", ModelFamily::TransformerSingleLabel),
            ],
            Some("fast"),
            Arc::new(TestLoader),
        )
        .unwrap()
    }

    #[test]
    fn test_switch_scenario() {
        let svc = service();
        let r = svc.predict("great product").unwrap();
        assert_eq!(r.model_identifier, "fast");
        assert_eq!(r.predicted_label, PredictedLabel::Single("pos".into()));

        let confirmation = svc.switch_model("accurate").unwrap();
        assert_eq!(confirmation.previous_model.as_deref(), Some("fast"));
        assert_eq!(confirmation.current_model, "accurate");

        let r = svc.predict("great product").unwrap();
        assert_eq!(r.model_identifier, "accurate");
        assert_eq!(svc.health().active_model.as_deref(), Some("accurate"));
    }

    #[test]
    fn test_unknown_switch_keeps_serving_prior_model() {
        let svc = service();
        let err = svc.switch_model("nonexistent").unwrap_err();
        assert_eq!(err, SwitchError::UnknownModel("nonexistent".into()));
        assert!(!err.is_retryable());
        assert_eq!(svc.predict("great").unwrap().model_identifier, "fast");
    }

    #[test]
    fn test_failed_load_during_switch() {
        let svc = service();
        let err = svc.switch_model("broken").unwrap_err();
        assert!(matches!(err, SwitchError::LoadFailed { .. }));
        assert!(err.is_retryable());

        let health = svc.health();
        assert!(health.ok);
        assert_eq!(health.active_model.as_deref(), Some("fast"));
        assert_eq!(health.loaded_models, vec!["fast"]);
        assert_eq!(svc.predict("great").unwrap().model_identifier, "fast");
    }

    #[test]
    fn test_predict_reflects_new_label_set() {
        let svc = service();
        assert_eq!(svc.predict("idiot").unwrap().labels, vec!["neg", "pos"]);

        svc.switch_model("toxicity").unwrap();
        let r = svc.predict("you idiot").unwrap();
        assert_eq!(r.labels, vec!["toxic", "threat", "insult"]);
        assert_eq!(r.scores.len(), 3);
        assert_eq!(
            r.predicted_label,
            PredictedLabel::Multi(vec!["toxic".into(), "insult".into()])
        );

        let empty = svc.predict("").unwrap();
        assert_eq!(empty.scores.len(), 3);
        assert_eq!(empty.predicted_label, PredictedLabel::Multi(vec![]));
    }

    #[test]
    fn test_list_models_stable_order() {
        let svc = service();
        let ids: Vec<String> = svc.list_models().into_iter().map(|d| d.identifier).collect();
        assert_eq!(ids, vec!["fast", "accurate", "toxicity", "broken"]);
    }

    #[test]
    fn test_batch_uses_one_model() {
        let svc = service();
        let texts = vec!["great".to_string(), "".to_string(), "meh".to_string()];
        let results = svc.predict_batch(&texts).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results
            .iter()
            .all(|r| r.as_ref().unwrap().model_identifier == "fast"));
        assert_eq!(svc.stats().inference_count, 3);
    }

    #[test]
    fn test_health_degrades_after_shutdown() {
        let svc = service();
        svc.shutdown();
        let health = svc.health();
        assert!(!health.ok);
        assert!(health.active_model.is_none());
        assert_eq!(svc.predict("x").unwrap_err(), ServiceError::NoActiveModel);
    }

    #[test]
    fn test_bootstrap_fails_fast() {
        let empty = InferenceService::bootstrap(vec![], None, Arc::new(TestLoader));
        assert!(matches!(empty, Err(ServiceError::Startup(_))));

        let unknown = InferenceService::bootstrap(
            vec![binary("fast", ModelFamily::BaselineLinear)],
            Some("missing"),
            Arc::new(TestLoader),
        );
        assert!(matches!(unknown, Err(ServiceError::Startup(_))));

        let broken = InferenceService::bootstrap(
            vec![binary("broken", ModelFamily::BaselineLinear)],
            None,
            Arc::new(TestLoader),
        );
        assert!(matches!(broken, Err(ServiceError::Startup(_))));
    }

    #[test]
    fn test_engine_status_counts() {
        let svc = service();
        svc.predict("great").unwrap();
        svc.switch_model("accurate").unwrap();
        let status = svc.engine_status();
        assert_eq!(status.active_model.as_deref(), Some("accurate"));
        assert_eq!(status.registered_models, 4);
        assert_eq!(status.models.len(), 2);
        assert_eq!(status.inference.inference_count, 1);
        assert_eq!(status.models[0].prediction_count, 1);
    }

    #[test]
    fn test_evict_through_service() {
        let svc = service();
        svc.switch_model("accurate").unwrap();
        assert!(svc.evict_model("fast").unwrap());
        assert_eq!(svc.health().loaded_models, vec!["accurate"]);
        assert!(matches!(
            svc.evict_model("accurate"),
            Err(RegistryError::ActiveModel(_))
        ));
    }
}
