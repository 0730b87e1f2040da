//! Storage error types
//!
//! "Not found" is never an error for lookups: those return `Ok(None)`.
//! A [`StorageError`] always means the backend itself failed.

use thiserror::Error;
use tracing::error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Wrap a backend failure, logging it at the point it is raised
    pub fn database<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let message = message.into();
        error!("{}: {}", message, source);
        Self::Database {
            message,
            source: Some(Box::new(source)),
        }
    }
}
