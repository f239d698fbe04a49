//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// JSON manifest listing the model descriptors
    pub models_config: PathBuf,

    /// Model activated at startup (first manifest entry when unset)
    pub default_model: Option<String>,

    /// Upper bound on a single prediction, in milliseconds
    pub predict_timeout_ms: u64,

    /// Maximum characters accepted per text
    pub max_text_length: usize,

    /// Maximum texts per batch request
    pub max_batch_size: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            models_config: PathBuf::from("models/models.json"),
            default_model: None,
            predict_timeout_ms: 30_000,
            max_text_length: 10_000,
            max_batch_size: 64,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            models_config: env::var("MODELS_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_config),

            default_model: env::var("DEFAULT_MODEL")
                .ok()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),

            predict_timeout_ms: env::var("PREDICT_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.predict_timeout_ms),

            max_text_length: env::var("MAX_TEXT_LENGTH")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.max_text_length),

            max_batch_size: env::var("MAX_BATCH_SIZE")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.max_batch_size),

            environment: env::var("ENVIRONMENT")
                .unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
