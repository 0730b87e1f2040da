//! Application state shared by all handlers

use crate::{
    auth::{IdentityResolver, JwtIdentityResolver, JwtService},
    gate::SettingsGate,
    WebConfig, WebResult,
};
use serverdesk_core::{MemoryStorage, Storage};
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "sqlite")]
use serverdesk_core::SqliteStorage;

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Servers, memberships and tasks
    pub storage: Arc<dyn Storage>,
    /// Resolves the caller of a request
    pub identity: Arc<dyn IdentityResolver>,
    /// Issues session tokens
    pub jwt: JwtService,
    /// Guards every server settings route
    pub gate: SettingsGate,
}

impl AppState {
    /// Create application state with the storage backend named by the config
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let storage: Arc<dyn Storage> = match &config.database_url {
            #[cfg(feature = "sqlite")]
            Some(database_url) => Arc::new(SqliteStorage::connect(database_url).await?),
            #[cfg(not(feature = "sqlite"))]
            Some(_) => {
                return Err(crate::WebError::Config(
                    "database_url requires the `sqlite` feature".to_string(),
                ))
            }
            None => Arc::new(MemoryStorage::new()),
        };

        let jwt = JwtService::new(&config.jwt_secret, config.token_ttl_secs);
        let identity = Arc::new(JwtIdentityResolver::new(jwt.clone()));

        let state = Self::with_services(config, storage, identity, jwt);
        info!(
            "Application state initialized with {} storage",
            state.storage.backend_name()
        );
        Ok(state)
    }

    /// Assemble state from explicit collaborators
    pub fn with_services(
        config: WebConfig,
        storage: Arc<dyn Storage>,
        identity: Arc<dyn IdentityResolver>,
        jwt: JwtService,
    ) -> Self {
        let gate = SettingsGate::new(storage.clone(), identity.clone());
        Self {
            config,
            storage,
            identity,
            jwt,
            gate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_by_default() {
        let state = AppState::new(WebConfig::default()).await.unwrap();
        assert_eq!(state.storage.backend_name(), "memory");
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_storage_from_url() {
        let config = WebConfig {
            database_url: Some("sqlite::memory:".to_string()),
            ..WebConfig::default()
        };
        let state = AppState::new(config).await.unwrap();
        assert_eq!(state.storage.backend_name(), "sqlite");
        assert!(state.storage.health_check().await.is_ok());
    }
}
