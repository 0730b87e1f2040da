//! HTTP request handlers for the serverdesk web server
//!
//! This module contains all the HTTP request handlers organized by functionality.

pub mod api;
pub mod health;
pub mod settings;
pub mod setup;
pub mod tasks;
pub mod types;

// Re-export all handler functions
pub use api::*;
pub use health::*;
pub use settings::*;
pub use setup::*;
pub use tasks::*;

// Re-export all types for convenience
pub use types::*;

use crate::templates::{ErrorTemplate, HtmlTemplate};
use axum::{http::StatusCode, response::IntoResponse, response::Response};

/// Path of a server's settings page
pub fn settings_path(server_id: &str) -> String {
    format!("/servers/{}/settings", server_id)
}

/// Render the error page with `status`
pub(crate) fn error_page(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        HtmlTemplate(ErrorTemplate::new(status.as_u16(), message.into())),
    )
        .into_response()
}

/// Fallback for unknown routes
pub async fn not_found() -> Response {
    error_page(StatusCode::NOT_FOUND, "This page does not exist.")
}
