//! Handlers for classifier retraining and model artifact download.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use panelwatch_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::api_key::RequireAdminKey;
use crate::state::AppState;

/// Request body for POST /retrain.
#[derive(Debug, Deserialize)]
pub struct RetrainRequest {
    /// Feature rows in `[surface_temp, ambient_temp, accel_x, accel_y, accel_z]` order.
    pub features: Option<Vec<Vec<f64>>>,
    /// One label per row: 0 = normal, 1 = fault.
    pub labels: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct RetrainResponse {
    pub ok: bool,
    pub status: &'static str,
    pub model_version: u64,
    pub samples: usize,
}

/// POST /retrain
///
/// Train a new model and publish it. 400 when either field is missing or
/// empty, 409 while another retrain runs, 500 when training fails.
pub async fn retrain(State(state): State<AppState>, body: Bytes) -> AppResult<Json<RetrainResponse>> {
    let request: RetrainRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))?;

    let (features, labels) = match (request.features, request.labels) {
        (Some(f), Some(l)) if !f.is_empty() && !l.is_empty() => (f, l),
        _ => {
            return Err(AppError::BadRequest(
                "features and labels are required and must be non-empty".to_string(),
            ))
        }
    };

    let report = state.classifier().retrain(features, labels).await?;

    Ok(Json(RetrainResponse {
        ok: true,
        status: "Model trained and saved",
        model_version: report.model_version,
        samples: report.samples,
    }))
}

/// GET /download_model
///
/// Return the model artifact bytes exactly as stored on disk. Requires the
/// admin API key.
pub async fn download_model(
    State(state): State<AppState>,
    _admin: RequireAdminKey,
) -> AppResult<Response> {
    let path = state
        .classifier()
        .artifact_path()
        .ok_or_else(|| AppError::InternalError("No model artifact path configured".into()))?;

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "ModelArtifact",
                id: path.display().to_string(),
            }))
        }
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model.json".to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, bytes.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::InternalError(e.to_string()))
}
