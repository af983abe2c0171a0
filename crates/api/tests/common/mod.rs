#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use panelwatch_core::classifier::Classifier;
use panelwatch_core::status_store::StatusStore;
use panelwatch_events::{HashChainLedger, LedgerSink};
use panelwatch_pipeline::Pipeline;
use serde_json::Value;
use tower::ServiceExt;

use panelwatch_api::config::{LedgerConfig, LogFormat, ServerConfig};
use panelwatch_api::middleware::api_key::API_KEY_HEADER;
use panelwatch_api::router::build_app_router;
use panelwatch_api::state::AppState;

pub const ADMIN_KEY: &str = "test-admin-key";

/// Build a test `ServerConfig` whose model artifact lives under `dir`.
pub fn test_config(dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        model_path: dir.join("fault_model.json"),
        admin_api_key: Some(ADMIN_KEY.to_string()),
        ledger: LedgerConfig {
            url: None,
            journal_path: None,
            timeout_ms: 2000,
        },
        log_format: LogFormat::Text,
    }
}

/// Build the full application router with an in-memory hash-chain ledger.
///
/// The classifier loads whatever artifact exists at the configured model
/// path, so a fresh temp dir starts without a model.
pub async fn build_test_app(dir: &Path) -> Router {
    build_test_app_with_ledger(dir, Arc::new(HashChainLedger::in_memory())).await
}

/// Same as [`build_test_app`] with a caller-supplied ledger sink.
pub async fn build_test_app_with_ledger(dir: &Path, ledger: Arc<dyn LedgerSink>) -> Router {
    let config = test_config(dir);
    let classifier = Arc::new(Classifier::load(&config.model_path).await);
    let pipeline = Pipeline::new(classifier, Arc::new(StatusStore::new()), ledger);
    let state = AppState::new(config.clone(), pipeline);
    build_app_router(state, &config)
}

/// Ten healthy and ten overheated feature rows.
pub fn training_set() -> Value {
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for i in 0..10 {
        let jitter = f64::from(i) * 0.5;
        features.push(vec![22.0 + jitter, 23.0 + jitter * 0.2, 1.0, 0.02, -0.08]);
        labels.push(0);
        features.push(vec![70.0 + jitter, 40.0 + jitter * 0.2, 1.05, 0.03, -0.07]);
        labels.push(1);
    }
    serde_json::json!({ "features": features, "labels": labels })
}

pub fn healthy_reading(panel_id: &str) -> Value {
    serde_json::json!({
        "panel_id": panel_id,
        "surface_temp": 24.0,
        "ambient_temp": 23.5,
        "accel_x": 1.0,
        "accel_y": 0.02,
        "accel_z": -0.08,
    })
}

pub fn overheated_reading(panel_id: &str) -> Value {
    serde_json::json!({
        "panel_id": panel_id,
        "surface_temp": 74.0,
        "ambient_temp": 41.0,
        "accel_x": 1.05,
        "accel_y": 0.03,
        "accel_z": -0.07,
    })
}

/// Send a GET request to the given URI.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request carrying an `x-api-key` header.
pub async fn get_with_key(app: Router, uri: &str, key: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(API_KEY_HEADER, key)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, json: &Value) -> Response<Body> {
    post_raw(app, uri, &serde_json::to_string(json).unwrap()).await
}

/// Send a POST request with an arbitrary body labelled as JSON.
pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
