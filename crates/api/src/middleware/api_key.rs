//! Shared-secret admin extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use panelwatch_core::error::CoreError;
use panelwatch_core::hashing::sha256_hex;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the admin secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Proof that the request carried the configured admin API key.
///
/// Use this as an extractor parameter in any admin-only handler:
///
/// ```ignore
/// async fn my_handler(_admin: RequireAdminKey) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
///
/// Rejects with 403 when the header is missing, does not match, or no admin
/// key is configured at all.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdminKey;

impl FromRequestParts<AppState> for RequireAdminKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let forbidden = || AppError::Core(CoreError::Forbidden("Invalid or missing API key".into()));

        let expected = state.config.admin_api_key.as_deref().ok_or_else(|| {
            tracing::warn!("Admin request refused: ADMIN_API_KEY is not configured");
            forbidden()
        })?;

        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(forbidden)?;

        // Compare digests so the comparison time does not depend on how
        // much of the secret matched.
        if sha256_hex(presented.as_bytes()) != sha256_hex(expected.as_bytes()) {
            tracing::warn!("Admin request refused: API key mismatch");
            return Err(forbidden());
        }

        Ok(RequireAdminKey)
    }
}
