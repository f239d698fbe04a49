//! Text Classification API Server
//!
//! Multi-model inference over HTTP with hot-swap between registered models.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  TEXT CLASSIFICATION API                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────────┐   ┌───────────────┐  │
//! │  │  Axum     │──▶│ InferenceService │──▶│ ModelRegistry │  │
//! │  │ handlers  │   │  (textclf-core)  │   │ active/loaded │  │
//! │  └───────────┘   └──────────────────┘   └───────┬───────┘  │
//! │                                                 ▼          │
//! │                              ┌──────────────────────────┐  │
//! │                              │ ModelAdapter per model   │  │
//! │                              │ TF-IDF linear │ ONNX     │  │
//! │                              └──────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod manifest;
mod models;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{delete, get, post},
};
use textclf_core::{FsArtifactLoader, InferenceService};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (core `log` records are bridged into tracing)
    let json_logs = config.is_production();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "textclf_server=debug,textclf_core=info,tower_http=debug".into()))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Text Classification API starting ({})...", config.environment);
    tracing::info!("Model manifest: {}", config.models_config.display());

    let manifest = manifest::Manifest::load(&config.models_config)?;
    let default_model = config
        .default_model
        .clone()
        .or(manifest.default_model.clone());

    // Loads the default model before binding; any failure here is fatal
    let service = tokio::task::spawn_blocking(move || {
        InferenceService::bootstrap(
            manifest.models,
            default_model.as_deref(),
            Arc::new(FsArtifactLoader::new()),
        )
    })
    .await
    .context("startup task panicked")??;

    let state = AppState {
        service: Arc::new(service),
        config: config.clone(),
    };

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, releasing models...");
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || service.shutdown()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InferenceService>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::check))
        .route("/status", get(handlers::status::engine_status))

        // Models
        .route("/models", get(handlers::models::list))
        .route("/models/switch", post(handlers::models::switch))
        .route("/models/:name", delete(handlers::models::evict))

        // Inference
        .route("/predict", post(handlers::predict::predict))
        .route("/predict/batch", post(handlers::predict::predict_batch))

        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
