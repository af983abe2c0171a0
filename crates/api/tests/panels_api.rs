//! Integration tests for panel status and history queries.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, healthy_reading, post_json};
use serde_json::json;

#[tokio::test]
async fn history_of_unseen_panel_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    let response = get(app, "/panel_history/P404").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["panelId"], "P404");
    assert_eq!(json["history"], json!([]));
}

#[tokio::test]
async fn history_is_in_arrival_order() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    for temp in [24.0, 80.0, 90.0] {
        let mut reading = healthy_reading("P1");
        reading["surface_temp"] = json!(temp);
        post_json(app.clone(), "/ingest", &reading).await;
    }

    let json = body_json(get(app, "/panel_history/P1").await).await;
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 3);

    let temps: Vec<f64> = history
        .iter()
        .map(|e| e["input"]["surface_temp"].as_f64().unwrap())
        .collect();
    assert_eq!(temps, vec![24.0, 80.0, 90.0]);
    assert_eq!(history[2]["outcome"]["colorCode"], "purple");
    assert_eq!(
        history[2]["outcome"]["cause"],
        "Surface temperature fault (value: 90)"
    );
}

#[tokio::test]
async fn panels_lists_latest_status_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    post_json(app.clone(), "/ingest", &healthy_reading("P2")).await;
    post_json(app.clone(), "/ingest", &healthy_reading("P1")).await;
    post_json(app.clone(), "/ingest", &healthy_reading("unknown")).await;

    let json = body_json(get(app, "/panels").await).await;
    let ids: Vec<&str> = json["panels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["panelId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["P1", "P2", "unknown"]);
}

#[tokio::test]
async fn get_panel_returns_current_status() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    let mut reading = healthy_reading("P7");
    reading["timestamp"] = json!(1_700_000_000);
    post_json(app.clone(), "/ingest", &reading).await;

    let response = get(app, "/panels/P7").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["panelId"], "P7");
    assert_eq!(json["timestampUnix"], 1_700_000_000);
    // No model loaded yet.
    assert_eq!(json["colorCode"], "purple");
    assert_eq!(json["errorKind"], "ml_failure");
    assert_eq!(json["lastPrediction"], -1);
}

#[tokio::test]
async fn get_unknown_panel_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path()).await;

    let response = get(app, "/panels/P404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "NOT_FOUND");
}
