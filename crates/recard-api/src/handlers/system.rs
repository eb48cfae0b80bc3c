//! Health and capability handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::ApiError;
use crate::AppState;

/// Liveness probe.
///
/// GET /health
#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Service is up")))]
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// AI capability report: whether the provider is reachable and which
/// model regeneration would use.
///
/// GET /api/v1/ai/status
#[utoipa::path(get, path = "/api/v1/ai/status", tag = "System",
    responses((status = 200, description = "Provider availability")))]
pub async fn ai_status(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let status = state.ai_status.status().await;
    Ok(Json(status))
}
