//! Template system for server-side rendering
//!
//! This module provides templates for server-side rendering using Askama.

use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use serverdesk_core::{Identity, Server, Task};

/// Shown on the settings page to callers who do not administer the server
pub const NOT_ADMINISTRATOR_MESSAGE: &str = "You are not an administrator of this server.";

/// Renders any template as an HTML response
pub struct HtmlTemplate<T>(pub T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => crate::WebError::Template(err).into_response(),
        }
    }
}

/// Administrative task list, configured with the server it manages
pub struct TaskListView {
    pub server: Server,
    pub tasks: Vec<Task>,
}

/// Server settings page
#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub title: String,
    /// Present only for administrators
    pub task_list: Option<TaskListView>,
    pub denial: &'static str,
    pub error: Option<String>,
}

impl SettingsTemplate {
    pub fn authorized(server: Server, tasks: Vec<Task>) -> Self {
        Self {
            title: format!("Settings - {}", server.name),
            task_list: Some(TaskListView { server, tasks }),
            denial: NOT_ADMINISTRATOR_MESSAGE,
            error: None,
        }
    }

    pub fn denied() -> Self {
        Self {
            title: "Settings".to_string(),
            task_list: None,
            denial: NOT_ADMINISTRATOR_MESSAGE,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Server setup page
#[derive(Template)]
#[template(path = "setup.html")]
pub struct SetupTemplate {
    pub title: String,
    pub signed_in_as: Option<String>,
    pub error: Option<String>,
    pub name: String,
    pub id: String,
}

impl SetupTemplate {
    pub fn new(me: Option<&Identity>) -> Self {
        Self {
            title: "Set up a server".to_string(),
            signed_in_as: me.map(|identity| identity.name.clone()),
            error: None,
            name: String::new(),
            id: String::new(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Keep what the caller typed when re-rendering the form
    pub fn with_values(mut self, name: &str, id: &str) -> Self {
        self.name = name.to_string();
        self.id = id.to_string();
        self
    }
}

/// Error page template
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub error_code: u16,
    pub error_message: String,
}

impl ErrorTemplate {
    pub fn new(error_code: u16, error_message: String) -> Self {
        Self {
            title: format!("Error {} - Serverdesk", error_code),
            error_code,
            error_message,
        }
    }
}
