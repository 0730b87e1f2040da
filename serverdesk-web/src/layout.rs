//! Application layout
//!
//! A layout mount owns exactly one [`QueryClient`] and hands it to every page
//! routed beneath it. The client lives as long as the mounted routes do.

use crate::cache::{QueryClient, QueryClientConfig};
use axum::{Extension, Router};
use tracing::info;

pub struct AppLayout {
    query_client: QueryClient,
}

impl AppLayout {
    /// Mount a layout with its own query client
    pub fn mount(config: QueryClientConfig) -> Self {
        info!(
            stale_time_secs = config.stale_time_secs,
            max_entries = config.max_entries,
            "Mounting application layout"
        );
        Self {
            query_client: QueryClient::new(config),
        }
    }

    pub fn query_client(&self) -> &QueryClient {
        &self.query_client
    }

    /// Nest `routes` under this layout: each of them receives this mount's
    /// query client as an `Extension<QueryClient>`.
    pub fn wrap<S>(&self, routes: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        routes.layer(Extension(self.query_client.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_routes_share_the_mounted_client() {
        let layout = AppLayout::mount(QueryClientConfig::default());
        let expected = layout.query_client().clone();

        let check = move |Extension(client): Extension<QueryClient>| {
            let expected = expected.clone();
            async move {
                if client.same_client(&expected) {
                    "same"
                } else {
                    "different"
                }
            }
        };

        let app: Router = layout.wrap(
            Router::new()
                .route("/a", get(check.clone()))
                .route("/b", get(check)),
        );

        for uri in ["/a", "/b"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let body = http_body_util::BodyExt::collect(response.into_body())
                .await
                .unwrap()
                .to_bytes();
            assert_eq!(&body[..], b"same");
        }
    }

    #[tokio::test]
    async fn test_each_mount_gets_its_own_client() {
        let first = AppLayout::mount(QueryClientConfig::default());
        let second = AppLayout::mount(QueryClientConfig::default());
        assert!(!first.query_client().same_client(second.query_client()));
    }

    #[tokio::test]
    async fn test_client_released_with_routes() {
        let layout = AppLayout::mount(QueryClientConfig::default());
        let probe = layout.query_client().clone();
        let app: Router = layout.wrap(Router::new().route("/", get(|| async { "ok" })));
        assert!(probe.handle_count() >= 3);

        drop(app);
        drop(layout);
        assert_eq!(probe.handle_count(), 1);
    }
}
