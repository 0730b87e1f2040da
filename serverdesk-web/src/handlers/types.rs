//! Request and response types used by the handlers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serverdesk_core::{Server, Task};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Storage backend name
    #[schema(example = "sqlite")]
    pub storage: String,
}

/// A task as exposed by the JSON API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: String,
    #[schema(example = "nightly backup")]
    pub name: String,
    #[schema(example = "0 3 * * *")]
    pub schedule: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            name: task.name,
            schedule: task.schedule,
            enabled: task.enabled,
            created_at: task.created_at,
        }
    }
}

/// Tasks of one server
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskListResponse {
    #[schema(example = "srv1")]
    pub server_id: String,
    pub server_name: String,
    pub tasks: Vec<TaskResponse>,
}

impl TaskListResponse {
    pub fn new(server: Server, tasks: Vec<Task>) -> Self {
        Self {
            server_id: server.id,
            server_name: server.name,
            tasks: tasks.into_iter().map(TaskResponse::from).collect(),
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    #[schema(example = "not_administrator")]
    pub error: String,
    pub message: String,
}

/// Form posted to create a task
#[derive(Debug, Deserialize)]
pub struct NewTaskForm {
    pub name: String,
    pub schedule: String,
}

/// Form posted from the setup page
#[derive(Debug, Deserialize)]
pub struct SetupForm {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}
