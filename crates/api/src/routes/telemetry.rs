//! Route definitions for telemetry ingest and panel status.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::telemetry;
use crate::state::AppState;

/// ```text
/// POST /ingest                     -> ingest
/// GET  /panel_history/{panel_id}   -> panel_history
/// GET  /panels                     -> list_panels
/// GET  /panels/{panel_id}          -> get_panel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingest", post(telemetry::ingest))
        .route("/panel_history/{panel_id}", get(telemetry::panel_history))
        .route("/panels", get(telemetry::list_panels))
        .route("/panels/{panel_id}", get(telemetry::get_panel))
}
