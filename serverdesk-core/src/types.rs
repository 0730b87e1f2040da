//! Core domain records: servers, identities, memberships and tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An administrable server, addressed by an opaque id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Server {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// The resolved caller of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Membership of an identity in a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerUser {
    /// Identity name
    pub name: String,
    pub server_id: String,
    pub is_administrator: bool,
}

impl ServerUser {
    pub fn administrator(name: impl Into<String>, server_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_id: server_id.into(),
            is_administrator: true,
        }
    }

    pub fn member(name: impl Into<String>, server_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_id: server_id.into(),
            is_administrator: false,
        }
    }
}

/// A scheduled task managed from a server's settings page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub server_id: String,
    pub name: String,
    /// Free-form schedule expression, e.g. `0 9 * * MON`
    pub schedule: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create an enabled task with a fresh id
    pub fn new(
        server_id: impl Into<String>,
        name: impl Into<String>,
        schedule: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            server_id: server_id.into(),
            name: name.into(),
            schedule: schedule.into(),
            enabled: true,
            created_at: Utc::now(),
        }
    }
}
