pub mod health;
pub mod model;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree.
///
/// Everything is mounted at the root; sensor gateways post to `/ingest`
/// directly.
///
/// ```text
/// /                                  health (alias)
/// /health                            health
///
/// /ingest                            process one reading (POST)
/// /panel_history/{panel_id}          per-panel history
/// /panels                            current status of every panel
/// /panels/{panel_id}                 current status of one panel
///
/// /retrain                           train and publish a new model (POST)
/// /download_model                    model artifact (admin key)
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(telemetry::router())
        .merge(model::router())
}
