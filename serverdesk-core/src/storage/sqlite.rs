//! SQLite storage implementation

use super::{check_admin_of, Storage};
use crate::error::{StorageError, StorageResult};
use crate::types::{Server, ServerUser, Task};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite-backed storage
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and run the embedded migrations
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        info!("Connecting to SQLite database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StorageError::database("Invalid SQLite database URL", e))?
            .create_if_missing(true);

        // Every connection to `:memory:` opens a separate database
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::database("Failed to connect to SQLite database", e))?;

        let storage = Self::new(pool);
        storage.migrate().await?;
        Ok(storage)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::database("Database migration failed", e))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StorageError::InvalidData(format!("bad timestamp {:?}: {}", value, e)))
    }

    fn row_to_server(row: &SqliteRow) -> StorageResult<Server> {
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::database("Failed to read server row", e))?;

        Ok(Server {
            id: row
                .try_get("id")
                .map_err(|e| StorageError::database("Failed to read server row", e))?,
            name: row
                .try_get("name")
                .map_err(|e| StorageError::database("Failed to read server row", e))?,
            created_at: Self::parse_timestamp(&created_at)?,
        })
    }

    fn row_to_user(row: &SqliteRow) -> StorageResult<ServerUser> {
        let read = |e: sqlx::Error| StorageError::database("Failed to read server user row", e);

        Ok(ServerUser {
            name: row.try_get("name").map_err(read)?,
            server_id: row.try_get("server_id").map_err(read)?,
            is_administrator: row.try_get("is_administrator").map_err(read)?,
        })
    }

    fn row_to_task(row: &SqliteRow) -> StorageResult<Task> {
        let read = |e: sqlx::Error| StorageError::database("Failed to read task row", e);
        let created_at: String = row.try_get("created_at").map_err(read)?;

        Ok(Task {
            id: row.try_get("id").map_err(read)?,
            server_id: row.try_get("server_id").map_err(read)?,
            name: row.try_get("name").map_err(read)?,
            schedule: row.try_get("schedule").map_err(read)?,
            enabled: row.try_get("enabled").map_err(read)?,
            created_at: Self::parse_timestamp(&created_at)?,
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_server(&self, id: &str) -> StorageResult<Option<Server>> {
        let row = sqlx::query("SELECT id, name, created_at FROM servers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::database("Failed to load server", e))?;

        row.as_ref().map(Self::row_to_server).transpose()
    }

    async fn create_server_with_admin(
        &self,
        server: &Server,
        admin: &ServerUser,
    ) -> StorageResult<()> {
        check_admin_of(server, admin)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::database("Failed to begin transaction", e))?;

        let inserted = sqlx::query("INSERT INTO servers (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&server.id)
            .bind(&server.name)
            .bind(server.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(StorageError::Conflict(format!(
                    "server {} already exists",
                    server.id
                )));
            }
            Err(e) => return Err(StorageError::database("Failed to create server", e)),
        }

        sqlx::query(
            "INSERT INTO server_users (server_id, name, is_administrator) VALUES (?, ?, ?)",
        )
        .bind(&admin.server_id)
        .bind(&admin.name)
        .bind(admin.is_administrator)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::database("Failed to save server administrator", e))?;

        // Dropping `tx` on any early return above rolls both inserts back
        tx.commit()
            .await
            .map_err(|e| StorageError::database("Failed to commit server setup", e))?;

        debug!(
            "Created server {} administered by {} in SQLite storage",
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

        let row = sqlx::query(
            "SELECT name, server_id, is_administrator FROM server_users WHERE server_id = ? AND name = ?",
        )
        .bind(server_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to load server user", e))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn save_user(&self, user: &ServerUser) -> StorageResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO server_users (server_id, name, is_administrator) VALUES (?, ?, ?)",
        )
        .bind(&user.server_id)
        .bind(&user.name)
        .bind(user.is_administrator)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to save server user", e))?;

        Ok(())
    }

    async fn list_tasks(&self, server_id: &str) -> StorageResult<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT id, server_id, name, schedule, enabled, created_at FROM tasks WHERE server_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to list tasks", e))?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn get_task(&self, server_id: &str, task_id: &str) -> StorageResult<Option<Task>> {
        let row = sqlx::query(
            "SELECT id, server_id, name, schedule, enabled, created_at FROM tasks WHERE server_id = ? AND id = ?",
        )
        .bind(server_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to load task", e))?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn save_task(&self, task: &Task) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO tasks (id, server_id, name, schedule, enabled, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.server_id)
        .bind(&task.name)
        .bind(&task.schedule)
        .bind(task.enabled)
        .bind(task.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database("Failed to save task", e))?;

        debug!("Saved task {} to SQLite storage", task.id);
        Ok(())
    }

    async fn delete_task(&self, server_id: &str, task_id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE server_id = ? AND id = ?")
            .bind(server_id)
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::database("Failed to delete task", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("task {}", task_id)));
        }
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::database("SQLite health check failed", e))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
