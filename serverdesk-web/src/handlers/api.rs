//! JSON API handlers

use super::types::{ApiErrorResponse, TaskListResponse};
use crate::{auth::Credentials, gate::GateOutcome, AppState, WebError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serverdesk_core::StorageError;
use tracing::error;

/// Errors returned as JSON bodies
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Server {0} does not exist")]
    ServerNotFound(String),

    #[error("You are not an administrator of this server.")]
    NotAdministrator,

    #[error(transparent)]
    Internal(#[from] WebError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Internal(err.into())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::ServerNotFound(_) => (StatusCode::NOT_FOUND, "server_not_found"),
            Self::NotAdministrator => (StatusCode::FORBIDDEN, "not_administrator"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            Self::Internal(e) => {
                error!("API request failed: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ApiErrorResponse {
                error: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

/// List a server's tasks
#[utoipa::path(
    get,
    path = "/api/servers/{id}/tasks",
    tag = "Tasks",
    summary = "List tasks",
    description = "List the administrative tasks of a server. Only administrators of the server may call this.",
    params(
        ("id" = String, Path, description = "Server id")
    ),
    responses(
        (status = 200, description = "Tasks of the server", body = TaskListResponse),
        (status = 403, description = "Caller is not an administrator", body = ApiErrorResponse),
        (status = 404, description = "Server does not exist", body = ApiErrorResponse),
        (status = 500, description = "Lookup failed", body = ApiErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn list_tasks_api(
    State(state): State<AppState>,
    Path(id): Path<String>,
    credentials: Credentials,
) -> Result<Json<TaskListResponse>, ApiError> {
    match state.gate.evaluate(&id, &credentials).await? {
        GateOutcome::Authorized(server) => {
            let tasks = state.storage.list_tasks(&server.id).await?;
            Ok(Json(TaskListResponse::new(server, tasks)))
        }
        GateOutcome::Redirect { .. } => Err(ApiError::ServerNotFound(id)),
        GateOutcome::Denied => Err(ApiError::NotAdministrator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::ServerNotFound("x".into()).status_and_code(),
            (StatusCode::NOT_FOUND, "server_not_found")
        );
        assert_eq!(
            ApiError::NotAdministrator.status_and_code(),
            (StatusCode::FORBIDDEN, "not_administrator")
        );
        let internal: ApiError = StorageError::InvalidData("bad row".into()).into();
        assert_eq!(internal.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
