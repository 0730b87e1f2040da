//! Serverdesk Web Server
//!
//! Server-rendered settings pages for administrable servers. Every page under
//! the application layout shares one [`cache::QueryClient`], and every
//! settings route is guarded by the [`gate::SettingsGate`].

pub mod auth;
pub mod cache;
pub mod gate;
pub mod handlers;
pub mod layout;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

// Re-export main types
pub use layout::AppLayout;
pub use server::ServerdeskServer;
pub use state::AppState;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Router,
};
use cache::QueryClientConfig;
use serde::Deserialize;
use serverdesk_core::{LoggingConfig, StorageError};
use std::path::Path;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Create the main application router with a freshly mounted layout
pub fn create_app(state: AppState) -> Router {
    let layout = AppLayout::mount(state.config.query_cache.clone());
    create_app_with_layout(state, &layout)
}

/// Create the main application router under an existing layout mount
pub fn create_app_with_layout(state: AppState, layout: &AppLayout) -> Router {
    Router::new()
        // Pages share the layout's query client
        .merge(layout.wrap(routes::app_routes()))
        // JSON API
        .nest("/api", routes::api_routes())
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

const DEFAULT_JWT_SECRET: &str = "serverdesk-default-secret-change-in-production";

/// Configuration for the web server
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable development mode
    pub dev_mode: bool,
    /// SQLite database URL; in-memory storage when unset
    pub database_url: Option<String>,
    /// HMAC secret for session tokens
    pub jwt_secret: String,
    /// Lifetime of issued session tokens, in seconds
    pub token_ttl_secs: i64,
    /// Query cache settings for the application layout
    #[serde(default)]
    pub query_cache: QueryClientConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            database_url: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_secs: 3600,
            query_cache: QueryClientConfig::default(),
        }
    }
}

impl WebConfig {
    /// Load configuration: defaults, then an optional TOML file, then
    /// `SERVERDESK_*` environment variables.
    pub fn load(config_file: Option<&Path>) -> WebResult<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("host", defaults.host)
            .and_then(|b| b.set_default("port", defaults.port as i64))
            .and_then(|b| b.set_default("dev_mode", defaults.dev_mode))
            .and_then(|b| b.set_default("jwt_secret", defaults.jwt_secret))
            .and_then(|b| b.set_default("token_ttl_secs", defaults.token_ttl_secs))
            .map_err(|e| WebError::Config(e.to_string()))?;

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path));
        }

        builder
            .add_source(config::Environment::with_prefix("SERVERDESK").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize::<WebConfig>())
            .map_err(|e| WebError::Config(e.to_string()))
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether the signing secret is still the built-in default
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Authentication error: {0}")]
    Auth(#[from] auth::AuthError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);

        let page = templates::ErrorTemplate::new(
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            "Something went wrong while loading this page.".to_string(),
        );
        match page.render() {
            Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        }
    }
}

/// Initialize logging for the web server
pub fn init_logging(dev_mode: bool, level: Option<&str>) {
    let mut config = if dev_mode {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    };
    if let Some(level) = level {
        config.level = level.to_string();
        config.filter_directives = vec![
            format!("serverdesk_web={}", level),
            format!("serverdesk_core={}", level),
        ];
    }

    if let Err(e) = serverdesk_core::init_logging(&config) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}
