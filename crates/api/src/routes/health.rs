use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    status: &'static str,
    version: &'static str,
    model_loaded: bool,
    model_version: Option<u64>,
}

/// Always 200; `degraded` while no model is loaded.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let classifier = state.classifier();
    let model_loaded = classifier.is_loaded();
    Json(HealthResponse {
        ok: true,
        status: if model_loaded { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        model_loaded,
        model_version: classifier.model_version(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
}
