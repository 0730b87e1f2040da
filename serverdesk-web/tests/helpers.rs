//! Integration test helpers
//!
//! Builds the full application router over in-memory storage and drives it
//! with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serverdesk_core::{
    MemoryStorage, Server, ServerUser, Storage, StorageError, StorageResult, Task,
};
use serverdesk_web::{
    auth::{JwtIdentityResolver, JwtService, DEV_USER_HEADER},
    create_app, AppState, WebConfig,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, LazyLock,
};
use tower::ServiceExt;

// Tracing is initialized once per test binary
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Who a request is sent as
#[derive(Clone, Copy)]
pub enum As<'a> {
    Anonymous,
    /// Development-mode name header
    Dev(&'a str),
    Bearer(&'a str),
    Cookie(&'a str),
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_config(WebConfig {
        dev_mode: true,
        ..WebConfig::default()
    })
    .await
}

pub async fn spawn_app_with_config(config: WebConfig) -> TestApp {
    LazyLock::force(&TRACING);

    let state = AppState::new(config)
        .await
        .expect("Failed to build application state");
    let router = create_app(state.clone());

    TestApp { router, state }
}

/// Build the app over `storage` instead of the configured backend
pub fn spawn_app_with_storage(storage: Arc<dyn Storage>) -> TestApp {
    LazyLock::force(&TRACING);

    let config = WebConfig {
        dev_mode: true,
        ..WebConfig::default()
    };
    let jwt = JwtService::new(&config.jwt_secret, config.token_ttl_secs);
    let identity = Arc::new(JwtIdentityResolver::new(jwt.clone()));
    let state = AppState::with_services(config, storage, identity, jwt);
    let router = create_app(state.clone());

    TestApp { router, state }
}

/// In-memory storage that fails every operation while `offline` is set
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: MemoryStorage,
    offline: AtomicBool,
}

impl FlakyStorage {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::database(
                "Storage unavailable",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "offline"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn get_server(&self, id: &str) -> StorageResult<Option<Server>> {
        self.check()?;
        self.inner.get_server(id).await
    }

    async fn create_server_with_admin(
        &self,
        server: &Server,
        admin: &ServerUser,
    ) -> StorageResult<()> {
        self.check()?;
        self.inner.create_server_with_admin(server, admin).await
    }

    async fn get_user(
        &self,
        name: Option<&str>,
        server_id: Option<&str>,
    ) -> StorageResult<Option<ServerUser>> {
        self.check()?;
        self.inner.get_user(name, server_id).await
    }

    async fn save_user(&self, user: &ServerUser) -> StorageResult<()> {
        self.check()?;
        self.inner.save_user(user).await
    }

    async fn list_tasks(&self, server_id: &str) -> StorageResult<Vec<Task>> {
        self.check()?;
        self.inner.list_tasks(server_id).await
    }

    async fn get_task(&self, server_id: &str, task_id: &str) -> StorageResult<Option<Task>> {
        self.check()?;
        self.inner.get_task(server_id, task_id).await
    }

    async fn save_task(&self, task: &Task) -> StorageResult<()> {
        self.check()?;
        self.inner.save_task(task).await
    }

    async fn delete_task(&self, server_id: &str, task_id: &str) -> StorageResult<()> {
        self.check()?;
        self.inner.delete_task(server_id, task_id).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.check()
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

impl TestApp {
    /// Seed a server administered by `owner`
    pub async fn seed_server(&self, id: &str, name: &str) -> Server {
        let server = Server::new(id, name);
        self.state
            .storage
            .create_server_with_admin(&server, &ServerUser::administrator("owner", id))
            .await
            .expect("Failed to seed server");
        server
    }

    pub async fn seed_user(&self, name: &str, server_id: &str, is_administrator: bool) {
        let user = if is_administrator {
            ServerUser::administrator(name, server_id)
        } else {
            ServerUser::member(name, server_id)
        };
        self.state
            .storage
            .save_user(&user)
            .await
            .expect("Failed to seed user");
    }

    pub async fn seed_task(&self, server_id: &str, name: &str) -> Task {
        let task = Task::new(server_id, name, "0 3 * * *");
        self.state
            .storage
            .save_task(&task)
            .await
            .expect("Failed to seed task");
        task
    }

    pub fn token_for(&self, name: &str) -> String {
        self.state.jwt.issue(name).expect("Failed to issue token")
    }

    pub async fn get(&self, uri: &str, who: As<'_>) -> Response<Body> {
        let request = authenticate(Request::builder().uri(uri), who)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, who: As<'_>, form: &str) -> Response<Body> {
        let request = authenticate(Request::builder().method("POST").uri(uri), who)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request.")
    }
}

fn authenticate(builder: axum::http::request::Builder, who: As<'_>) -> axum::http::request::Builder {
    match who {
        As::Anonymous => builder,
        As::Dev(name) => builder.header(DEV_USER_HEADER, name),
        As::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        As::Cookie(token) => builder.header(header::COOKIE, format!("serverdesk_session={}", token)),
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).expect("Body is not JSON")
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok());
    assert_eq!(location, Some(to));
}
