//! OpenAPI specification for the Serverdesk JSON API

use axum::{http::header, response::IntoResponse};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::{ApiErrorResponse, HealthResponse, TaskListResponse, TaskResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Serverdesk API",
        version = "0.1.0",
        description = "Administrative tasks of managed servers",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,
        crate::handlers::list_tasks_api,
    ),
    components(
        schemas(
            HealthResponse,
            TaskResponse,
            TaskListResponse,
            ApiErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Tasks", description = "Server task operations"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Serve the OpenAPI document
pub async fn openapi_json() -> impl IntoResponse {
    match ApiDoc::openapi().to_pretty_json() {
        Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => crate::WebError::Config(format!("OpenAPI serialization failed: {}", e))
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Serverdesk API");
        assert!(openapi.paths.paths.contains_key("/api/health"));
        assert!(openapi.paths.paths.contains_key("/api/servers/{id}/tasks"));
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let json = ApiDoc::openapi().to_pretty_json().unwrap();
        assert!(json.contains("bearer_token"));
        assert!(json.contains("not_administrator"));
    }
}
