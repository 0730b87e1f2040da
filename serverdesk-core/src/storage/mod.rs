//! Storage backends for servers, memberships and tasks
//!
//! Lookups answer `Ok(None)` for records that do not exist; an `Err` is
//! reserved for backend failures.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryStorage;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

use crate::error::{StorageError, StorageResult};
use crate::types::{Server, ServerUser, Task};
use async_trait::async_trait;

/// Persistence operations used by the web layer
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load a server by id
    async fn get_server(&self, id: &str) -> StorageResult<Option<Server>>;

    /// Insert a new server together with its first administrator.
    ///
    /// Both records are written or neither is. Fails with `Conflict` if the
    /// id is taken and with `InvalidData` if `admin` belongs to another server.
    async fn create_server_with_admin(&self, server: &Server, admin: &ServerUser)
        -> StorageResult<()>;

    /// Look up the membership of `name` in `server_id`.
    ///
    /// Either side may be absent (an unauthenticated caller, an unresolved
    /// server); that answers `Ok(None)` without touching the backend.
    async fn get_user(
        &self,
        name: Option<&str>,
        server_id: Option<&str>,
    ) -> StorageResult<Option<ServerUser>>;

    /// Insert or replace a membership
    async fn save_user(&self, user: &ServerUser) -> StorageResult<()>;

    /// List a server's tasks, oldest first
    async fn list_tasks(&self, server_id: &str) -> StorageResult<Vec<Task>>;

    /// Load a task belonging to `server_id`
    async fn get_task(&self, server_id: &str, task_id: &str) -> StorageResult<Option<Task>>;

    /// Insert or replace a task
    async fn save_task(&self, task: &Task) -> StorageResult<()>;

    /// Delete a task. Fails with `NotFound` if it does not exist.
    async fn delete_task(&self, server_id: &str, task_id: &str) -> StorageResult<()>;

    /// Health check for the storage backend
    async fn health_check(&self) -> StorageResult<()>;

    /// Short backend name for diagnostics
    fn backend_name(&self) -> &'static str;
}

/// Reject an administrator record that does not belong to `server`
pub(crate) fn check_admin_of(server: &Server, admin: &ServerUser) -> StorageResult<()> {
    if admin.server_id != server.id || !admin.is_administrator {
        return Err(StorageError::InvalidData(format!(
            "{} is not an administrator record for server {}",
            admin.name, server.id
        )));
    }
    Ok(())
}
