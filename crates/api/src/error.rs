use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use panelwatch_core::classifier::ClassifierError;
use panelwatch_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses
/// of the form `{ "ok": false, "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `panelwatch_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Busy => AppError::Core(CoreError::Conflict(err.to_string())),
            ClassifierError::Training(e) => AppError::Core(CoreError::Training(e.to_string())),
            ClassifierError::Persist(_) => AppError::Core(CoreError::Training(err.to_string())),
            ClassifierError::Unavailable
            | ClassifierError::UnknownClass(_)
            | ClassifierError::Internal(_) => AppError::Core(CoreError::Internal(err.to_string())),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Training(msg) => {
                    tracing::error!(error = %msg, "Model training failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "TRAINING_ERROR",
                        msg.clone(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "ok": false,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
