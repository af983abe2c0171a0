//! Handlers for telemetry ingest and panel status queries.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use panelwatch_core::error::CoreError;
use panelwatch_core::reading::Reading;
use panelwatch_core::status::{ColorCode, HistoryEntry, PanelStatus, SystemErrorKind};
use panelwatch_pipeline::IngestOutcome;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Outward view of one processed reading.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// False only for system errors (purple).
    pub ok: bool,
    pub panel_id: String,
    pub color: ColorCode,
    pub status: String,
    pub prediction: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<SystemErrorKind>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        let IngestOutcome {
            status,
            warnings,
            receipt,
            ..
        } = outcome;
        Self {
            ok: status.color_code != ColorCode::Purple,
            panel_id: status.panel_id,
            color: status.color_code,
            status: status.status_text,
            prediction: status.last_prediction,
            reason: status.cause,
            error_kind: status.error_kind,
            warnings,
            tx_hash: receipt.map(|r| r.0),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelHistoryResponse {
    pub panel_id: String,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct PanelListResponse {
    pub panels: Vec<PanelStatus>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /ingest
///
/// Every parseable body is fully processed and answered with 200, whatever
/// the verdict. Only unparseable JSON is a 400.
pub async fn ingest(State(state): State<AppState>, body: Bytes) -> AppResult<Json<IngestResponse>> {
    let reading: Reading = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))?;

    let outcome = state.pipeline.ingest(reading).await;
    Ok(Json(IngestResponse::from(outcome)))
}

/// GET /panel_history/{panel_id}
///
/// History in arrival order; empty for panels never seen.
pub async fn panel_history(
    State(state): State<AppState>,
    Path(panel_id): Path<String>,
) -> Json<PanelHistoryResponse> {
    let history = state.store().history(&panel_id).await;
    Json(PanelHistoryResponse { panel_id, history })
}

/// GET /panels
pub async fn list_panels(State(state): State<AppState>) -> Json<PanelListResponse> {
    Json(PanelListResponse {
        panels: state.store().snapshot().await,
    })
}

/// GET /panels/{panel_id}
pub async fn get_panel(
    State(state): State<AppState>,
    Path(panel_id): Path<String>,
) -> AppResult<Json<PanelStatus>> {
    state
        .store()
        .current(&panel_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Panel",
                id: panel_id,
            })
        })
}
