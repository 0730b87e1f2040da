//! In-memory storage (default backend)

use super::{check_admin_of, Storage};
use crate::error::{StorageError, StorageResult};
use crate::types::{Server, ServerUser, Task};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Tables {
    servers: HashMap<String, Server>,
    /// Keyed by (server id, identity name)
    users: HashMap<(String, String), ServerUser>,
    /// Keyed by (server id, task id)
    tasks: HashMap<(String, String), Task>,
}

/// In-memory storage backed by hash maps
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_server(&self, id: &str) -> StorageResult<Option<Server>> {
        let tables = self.tables.read().await;
        Ok(tables.servers.get(id).cloned())
    }

    async fn create_server_with_admin(
        &self,
        server: &Server,
        admin: &ServerUser,
    ) -> StorageResult<()> {
        check_admin_of(server, admin)?;

        let mut tables = self.tables.write().await;
        if tables.servers.contains_key(&server.id) {
            return Err(StorageError::Conflict(format!(
                "server {} already exists",
                server.id
            )));
        }
        tables.servers.insert(server.id.clone(), server.clone());
        tables
            .users
            .insert((admin.server_id.clone(), admin.name.clone()), admin.clone());
        debug!(
            "Created server {} administered by {} in memory storage",
            server.id, admin.name
        );
        Ok(())
    }

    async fn get_user(
        &self,
        name: Option<&str>,
        server_id: Option<&str>,
    ) -> StorageResult<Option<ServerUser>> {
        let (Some(name), Some(server_id)) = (name, server_id) else {
            return Ok(None);
        };

        let tables = self.tables.read().await;
        Ok(tables
            .users
            .get(&(server_id.to_string(), name.to_string()))
            .cloned())
    }

    async fn save_user(&self, user: &ServerUser) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        tables.users.insert(
            (user.server_id.clone(), user.name.clone()),
            user.clone(),
        );
        Ok(())
    }

    async fn list_tasks(&self, server_id: &str) -> StorageResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|task| task.server_id == server_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn get_task(&self, server_id: &str, task_id: &str) -> StorageResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .get(&(server_id.to_string(), task_id.to_string()))
            .cloned())
    }

    async fn save_task(&self, task: &Task) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .tasks
            .insert((task.server_id.clone(), task.id.clone()), task.clone());
        debug!("Saved task {} for server {}", task.id, task.server_id);
        Ok(())
    }

    async fn delete_task(&self, server_id: &str, task_id: &str) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .tasks
            .remove(&(server_id.to_string(), task_id.to_string()))
            .is_some()
        {
            Ok(())
        } else {
            Err(StorageError::NotFound(format!("task {}", task_id)))
        }
    }

    async fn health_check(&self) -> StorageResult<()> {
        // Memory storage is always healthy
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_server_is_none() {
        let storage = MemoryStorage::new();
        assert!(storage.get_server("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_server_with_admin() {
        let storage = MemoryStorage::new();
        let server = Server::new("srv1", "Main");

        storage
            .create_server_with_admin(&server, &ServerUser::administrator("alice", "srv1"))
            .await
            .unwrap();

        let alice = storage
            .get_user(Some("alice"), Some("srv1"))
            .await
            .unwrap()
            .unwrap();
        assert!(alice.is_administrator);

        // A conflicting setup must not hand the existing server a new administrator
        let err = storage
            .create_server_with_admin(&server, &ServerUser::administrator("mallory", "srv1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(storage.get_server("srv1").await.unwrap(), Some(server));
        assert!(storage
            .get_user(Some("mallory"), Some("srv1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_server_with_foreign_admin_writes_nothing() {
        let storage = MemoryStorage::new();
        let server = Server::new("srv1", "Main");

        let err = storage
            .create_server_with_admin(&server, &ServerUser::administrator("alice", "srv2"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));

        let err = storage
            .create_server_with_admin(&server, &ServerUser::member("alice", "srv1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));

        assert!(storage.get_server("srv1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_user_tolerates_absent_keys() {
        let storage = MemoryStorage::new();
        storage
            .save_user(&ServerUser::administrator("alice", "srv1"))
            .await
            .unwrap();

        assert!(storage.get_user(None, Some("srv1")).await.unwrap().is_none());
        assert!(storage.get_user(Some("alice"), None).await.unwrap().is_none());
        assert!(storage.get_user(None, None).await.unwrap().is_none());

        let user = storage
            .get_user(Some("alice"), Some("srv1"))
            .await
            .unwrap()
            .unwrap();
        assert!(user.is_administrator);
    }

    #[tokio::test]
    async fn test_membership_is_scoped_to_server() {
        let storage = MemoryStorage::new();
        storage
            .save_user(&ServerUser::administrator("alice", "srv1"))
            .await
            .unwrap();

        assert!(storage
            .get_user(Some("alice"), Some("srv2"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_tasks_are_listed_per_server() {
        let storage = MemoryStorage::new();
        let backup = Task::new("srv1", "backup", "0 3 * * *");
        let other = Task::new("srv2", "restart", "@daily");
        storage.save_task(&backup).await.unwrap();
        storage.save_task(&other).await.unwrap();

        let tasks = storage.list_tasks("srv1").await.unwrap();
        assert_eq!(tasks, vec![backup.clone()]);

        storage.delete_task("srv1", &backup.id).await.unwrap();
        assert!(storage.list_tasks("srv1").await.unwrap().is_empty());
        assert!(matches!(
            storage.delete_task("srv1", &backup.id).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
