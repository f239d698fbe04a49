//! Router-level tests against real baseline artifacts on disk.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use textclf_core::{FsArtifactLoader, InferenceService, ModelDescriptor, ModelFamily};
use tower::ServiceExt;

use crate::config::Config;
use crate::{create_router, AppState};

const SENTIMENT_BUNDLE: &str = r#"{
    "vocabulary": {"great": 0, "bad": 1, "product": 2},
    "idf": [1.0, 1.0, 1.0],
    "coef": [[3.0, -3.0, 0.0]],
    "intercept": [0.0]
}"#;

const TOPIC_BUNDLE: &str = r#"{
    "vocabulary": {"football": 0, "election": 1, "software": 2},
    "idf": [1.0, 1.0, 1.0],
    "coef": [[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]],
    "intercept": [0.0, 0.0, 0.0]
}"#;

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn descriptors(dir: &Path) -> Vec<ModelDescriptor> {
    std::fs::write(dir.join("sentiment.json"), SENTIMENT_BUNDLE).unwrap();
    std::fs::write(dir.join("topics.json"), TOPIC_BUNDLE).unwrap();
    vec![
        ModelDescriptor::new(
            "fast",
            ModelFamily::BaselineLinear,
            dir.join("sentiment.json"),
            labels(&["neg", "pos"]),
        )
        .with_description("TF-IDF + logistic regression"),
        ModelDescriptor::new(
            "topics",
            ModelFamily::BaselineLinear,
            dir.join("topics.json"),
            labels(&["sports", "politics", "tech"]),
        ),
        ModelDescriptor::new(
            "broken",
            ModelFamily::TransformerSingleLabel,
            dir.join("missing-model"),
            labels(&["neg", "pos"]),
        ),
    ]
}

fn app(dir: &Path) -> Router {
    let service = InferenceService::bootstrap(
        descriptors(dir),
        Some("fast"),
        Arc::new(FsArtifactLoader::new()),
    )
    .unwrap();
    let config = Config {
        max_text_length: 50,
        max_batch_size: 3,
        ..Config::default()
    };
    create_router(AppState {
        service: Arc::new(service),
        config,
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_reports_default_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["current_model"], "fast");
    assert_eq!(body["num_classes"], 2);
    assert_eq!(body["available_models"], json!(["fast", "topics", "broken"]));
    assert_eq!(body["loaded_models"], json!(["fast"]));
}

#[tokio::test]
async fn test_predict_returns_sorted_scores() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = send(&app, "POST", "/predict", Some(json!({"text": "Great product"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_label"], "pos");
    assert_eq!(body["model"], "fast");
    assert_eq!(body["scores"][0]["label"], "pos");
    assert_eq!(body["scores"].as_array().unwrap().len(), 2);
    assert!(body["confidence"].as_f64().unwrap() > 0.5);
    assert!(body.get("flagged_labels").is_none());
}

#[tokio::test]
async fn test_predict_validation() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = send(&app, "POST", "/predict", Some(json!({"text": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["retryable"], false);
    assert_eq!(body["status"], 400);

    let long = "a".repeat(51);
    let (status, _) = send(&app, "POST", "/predict", Some(json!({ "text": long }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_switch_and_predict_with_new_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        "POST",
        "/models/switch",
        Some(json!({"model_name": "topics"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previous_model"], "fast");
    assert_eq!(body["current_model"], "topics");
    assert_eq!(body["type"], "baseline-linear");
    assert_eq!(body["num_classes"], 3);

    let (_, body) = send(
        &app,
        "POST",
        "/predict",
        Some(json!({"text": "new software release"})),
    )
    .await;
    assert_eq!(body["model"], "topics");
    assert_eq!(body["predicted_label"], "tech");
    assert_eq!(body["scores"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_switch_unknown_model_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        "POST",
        "/models/switch",
        Some(json!({"model_name": "nonexistent"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "unknown_model");

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["current_model"], "fast");
}

#[tokio::test]
async fn test_switch_load_failure_keeps_previous_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        "POST",
        "/models/switch",
        Some(json!({"model_name": "broken"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "load_failed");
    assert_eq!(body["retryable"], true);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["current_model"], "fast");
    assert_eq!(health["loaded_models"], json!(["fast"]));

    let (status, body) = send(&app, "POST", "/predict", Some(json!({"text": "bad"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_label"], "neg");
}

#[tokio::test]
async fn test_models_listing_and_eviction() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    send(&app, "POST", "/models/switch", Some(json!({"model_name": "topics"}))).await;

    let (status, body) = send(&app, "GET", "/models", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_model"], "topics");
    let models = body["available_models"].as_array().unwrap();
    assert_eq!(models.len(), 3);
    assert_eq!(models[0]["name"], "fast");
    assert_eq!(models[0]["loaded"], true);
    assert_eq!(models[0]["active"], false);
    assert_eq!(models[0]["description"], "TF-IDF + logistic regression");
    assert_eq!(models[1]["active"], true);
    assert_eq!(models[2]["loaded"], false);

    let (status, body) = send(&app, "DELETE", "/models/topics", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "active_model");

    let (status, body) = send(&app, "DELETE", "/models/fast", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["was_loaded"], true);

    let (status, _) = send(&app, "DELETE", "/models/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["loaded_models"], json!(["topics"]));
}

#[tokio::test]
async fn test_batch_predict() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (status, body) = send(
        &app,
        "POST",
        "/predict/batch",
        Some(json!({"texts": ["great", "bad product"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "fast");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["predicted_label"], "pos");
    assert_eq!(results[1]["predicted_label"], "neg");

    let (status, _) = send(
        &app,
        "POST",
        "/predict/batch",
        Some(json!({"texts": ["a", "b", "c", "d"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/predict/batch",
        Some(json!({"texts": ["fine", " "]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("texts[1]"));
}

#[tokio::test]
async fn test_status_and_root() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    send(&app, "POST", "/predict", Some(json!({"text": "great"}))).await;

    let (status, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_model"], "fast");
    assert_eq!(body["registered_models"], 3);
    assert_eq!(body["inference"]["inference_count"], 1);
    assert_eq!(body["models"][0]["backend"], "tfidf-linear");

    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "fast");
}
