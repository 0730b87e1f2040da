//! Health check handlers

use super::types::HealthResponse;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use tracing::warn;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    summary = "Health check",
    description = "Check the server and storage health status",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse),
        (status = 503, description = "Storage is unavailable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code) = match state.storage.health_check().await {
        Ok(()) => ("healthy", StatusCode::OK),
        Err(e) => {
            warn!("Storage health check failed: {}", e);
            ("degraded", StatusCode::SERVICE_UNAVAILABLE)
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: state.storage.backend_name().to_string(),
        }),
    )
}
