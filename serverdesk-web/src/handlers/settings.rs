//! Server settings page

use crate::{
    auth::Credentials,
    cache::{QueryClient, QueryKey},
    gate::{GateOutcome, SETUP_PATH},
    templates::{HtmlTemplate, SettingsTemplate},
    AppState, WebError, WebResult,
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use serverdesk_core::Task;
use tracing::debug;

/// Site root sends visitors to the setup flow
pub async fn index() -> Redirect {
    Redirect::to(SETUP_PATH)
}

/// Settings page for one server.
///
/// Missing servers redirect to setup, non-administrators get the denial
/// text, administrators get the task list.
pub async fn settings_page(
    State(state): State<AppState>,
    Extension(query): Extension<QueryClient>,
    Path(id): Path<String>,
    credentials: Credentials,
) -> WebResult<Response> {
    match state.gate.evaluate(&id, &credentials).await? {
        GateOutcome::Redirect { to } => Ok(Redirect::to(to).into_response()),
        GateOutcome::Denied => Ok(HtmlTemplate(SettingsTemplate::denied()).into_response()),
        GateOutcome::Authorized(server) => {
            let tasks = load_tasks(&state, &query, &server.id).await?;
            debug!("Rendering {} tasks for server {}", tasks.len(), server.id);
            Ok(HtmlTemplate(SettingsTemplate::authorized(server, tasks)).into_response())
        }
    }
}

/// Task list for a server, through the layout's query cache
pub(crate) async fn load_tasks(
    state: &AppState,
    query: &QueryClient,
    server_id: &str,
) -> WebResult<Vec<Task>> {
    let storage = state.storage.clone();
    let id = server_id.to_string();

    query
        .fetch(QueryKey::tasks(server_id), || async move {
            storage.list_tasks(&id).await
        })
        .await
        .map_err(WebError::from)
}
