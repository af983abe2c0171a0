//! Integration tests for `POST /retrain` and `GET /download_model`.

mod common;

use axum::http::StatusCode;
use common::{
    body_bytes, body_json, get, get_with_key, overheated_reading, post_json, post_raw, ADMIN_KEY,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Retrain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn retrain_publishes_and_persists_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    let response = post_json(app.clone(), "/retrain", &common::training_set()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["status"], "Model trained and saved");
    assert_eq!(json["model_version"], 1);
    assert_eq!(json["samples"], 20);
    assert!(dir.path().join("fault_model.json").exists());

    let ingest = body_json(post_json(app, "/ingest", &overheated_reading("P1")).await).await;
    assert_eq!(ingest["color"], "red");
}

#[tokio::test]
async fn persisted_model_is_loaded_on_startup() {
    let dir = tempfile::tempdir().unwrap();
    let first = common::build_test_app(dir.path()).await;
    post_json(first, "/retrain", &common::training_set()).await;

    let restarted = common::build_test_app(dir.path()).await;
    let health = body_json(get(restarted.clone(), "/health").await).await;
    assert_eq!(health["model_loaded"], true);

    let ingest = body_json(post_json(restarted, "/ingest", &overheated_reading("P1")).await).await;
    assert_eq!(ingest["color"], "red");
}

#[tokio::test]
async fn retrain_requires_features_and_labels() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    for body in [
        json!({}),
        json!({ "features": [[1.0, 2.0, 3.0, 4.0, 5.0]] }),
        json!({ "labels": [0] }),
        json!({ "features": [], "labels": [] }),
    ] {
        let response = post_json(app.clone(), "/retrain", &body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_json(response).await["ok"], false);
    }
}

#[tokio::test]
async fn retrain_with_malformed_json_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    let response = post_raw(app, "/retrain", "features=1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn training_failure_is_500_and_keeps_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;
    post_json(app.clone(), "/retrain", &common::training_set()).await;

    let body = json!({
        "features": [[24.0, 23.5, 1.0, 0.02, -0.08], [74.0, 41.0, 1.05, 0.03, -0.07]],
        "labels": [0, 7],
    });
    let response = post_json(app.clone(), "/retrain", &body).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "TRAINING_ERROR");
    assert!(json["error"].is_string());

    let health = body_json(get(app, "/health").await).await;
    assert_eq!(health["model_version"], 1);
}

#[tokio::test]
async fn mismatched_lengths_are_training_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    let body = json!({ "features": [[24.0, 23.5, 1.0, 0.02, -0.08]], "labels": [0, 1] });
    let response = post_json(app, "/retrain", &body).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn download_without_key_is_403() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    let response = get(app, "/download_model").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn download_with_wrong_key_is_403() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;
    post_json(app.clone(), "/retrain", &common::training_set()).await;

    let response = get_with_key(app, "/download_model", "not-the-key").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn download_returns_artifact_bytes_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;
    post_json(app.clone(), "/retrain", &common::training_set()).await;

    let response = get_with_key(app, "/download_model", ADMIN_KEY).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );

    let on_disk = std::fs::read(dir.path().join("fault_model.json")).unwrap();
    assert_eq!(body_bytes(response).await, on_disk);
}

#[tokio::test]
async fn download_before_any_model_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    let response = get_with_key(app, "/download_model", ADMIN_KEY).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
