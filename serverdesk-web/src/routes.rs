//! Route definitions for the Serverdesk web server

use crate::{handlers, openapi, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Server-rendered pages. Mounted under the application layout.
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/setup",
            get(handlers::setup_page).post(handlers::submit_setup),
        )
        .route("/servers/{id}/settings", get(handlers::settings_page))
        .route("/servers/{id}/settings/tasks", post(handlers::create_task))
        .route(
            "/servers/{id}/settings/tasks/{task_id}/toggle",
            post(handlers::toggle_task),
        )
        .route(
            "/servers/{id}/settings/tasks/{task_id}/delete",
            post(handlers::delete_task),
        )
}

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/servers/{id}/tasks", get(handlers::list_tasks_api))
        .route("/openapi.json", get(openapi::openapi_json))
}
