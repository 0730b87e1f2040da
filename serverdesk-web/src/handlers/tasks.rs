//! Task mutations from the settings page
//!
//! Every mutation goes through the settings gate first. Successful changes
//! invalidate the server's cached task list and redirect back to settings.

use super::{error_page, settings::load_tasks, settings_path, types::NewTaskForm};
use crate::{
    auth::Credentials,
    cache::{QueryClient, QueryKey},
    gate::GateOutcome,
    templates::{HtmlTemplate, SettingsTemplate},
    AppState, WebResult,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serverdesk_core::{Server, StorageError, Task};
use tracing::info;

pub async fn create_task(
    State(state): State<AppState>,
    Extension(query): Extension<QueryClient>,
    Path(id): Path<String>,
    credentials: Credentials,
    Form(form): Form<NewTaskForm>,
) -> WebResult<Response> {
    let server = match state.gate.evaluate(&id, &credentials).await? {
        GateOutcome::Authorized(server) => server,
        outcome => return Ok(reject(outcome)),
    };

    let name = form.name.trim();
    let schedule = form.schedule.trim();
    if name.is_empty() || schedule.is_empty() {
        let tasks = load_tasks(&state, &query, &server.id).await?;
        let page = SettingsTemplate::authorized(server, tasks)
            .with_error("A task needs both a name and a schedule.");
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, HtmlTemplate(page)).into_response());
    }

    let task = Task::new(&server.id, name, schedule);
    state.storage.save_task(&task).await?;
    info!("Created task {} on server {}", task.id, server.id);

    Ok(changed(&query, &server).await)
}

/// Flip a task between enabled and paused
pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(query): Extension<QueryClient>,
    Path((id, task_id)): Path<(String, String)>,
    credentials: Credentials,
) -> WebResult<Response> {
    let server = match state.gate.evaluate(&id, &credentials).await? {
        GateOutcome::Authorized(server) => server,
        outcome => return Ok(reject(outcome)),
    };

    let Some(mut task) = state.storage.get_task(&server.id, &task_id).await? else {
        return Ok(task_not_found(&task_id));
    };

    task.enabled = !task.enabled;
    state.storage.save_task(&task).await?;
    info!(
        "Task {} on server {} is now {}",
        task.id,
        server.id,
        if task.enabled { "enabled" } else { "paused" }
    );

    Ok(changed(&query, &server).await)
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(query): Extension<QueryClient>,
    Path((id, task_id)): Path<(String, String)>,
    credentials: Credentials,
) -> WebResult<Response> {
    let server = match state.gate.evaluate(&id, &credentials).await? {
        GateOutcome::Authorized(server) => server,
        outcome => return Ok(reject(outcome)),
    };

    match state.storage.delete_task(&server.id, &task_id).await {
        Ok(()) => {}
        Err(StorageError::NotFound(_)) => return Ok(task_not_found(&task_id)),
        Err(e) => return Err(e.into()),
    }
    info!("Deleted task {} from server {}", task_id, server.id);

    Ok(changed(&query, &server).await)
}

/// Response for a caller the gate did not authorize
fn reject(outcome: GateOutcome) -> Response {
    match outcome {
        GateOutcome::Redirect { to } => Redirect::to(to).into_response(),
        _ => (StatusCode::FORBIDDEN, HtmlTemplate(SettingsTemplate::denied())).into_response(),
    }
}

async fn changed(query: &QueryClient, server: &Server) -> Response {
    query.invalidate(&QueryKey::tasks(&server.id)).await;
    Redirect::to(&settings_path(&server.id)).into_response()
}

fn task_not_found(task_id: &str) -> Response {
    error_page(
        StatusCode::NOT_FOUND,
        format!("Task {} does not exist on this server.", task_id),
    )
}
