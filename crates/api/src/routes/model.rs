//! Route definitions for the classifier model.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::model;
use crate::state::AppState;

/// `/download_model` requires the admin API key (enforced by the handler
/// extractor).
///
/// ```text
/// POST /retrain          -> retrain
/// GET  /download_model   -> download_model
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/retrain", post(model::retrain))
        .route("/download_model", get(model::download_model))
}
