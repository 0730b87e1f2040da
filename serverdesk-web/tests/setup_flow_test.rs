//! Server setup flow

mod helpers;

use axum::http::{header, StatusCode};
use helpers::{assert_redirect, body_string, spawn_app, spawn_app_with_storage, As, FlakyStorage};
use serverdesk_core::Storage;
use serverdesk_web::handlers::SIGN_IN_MESSAGE;
use std::sync::Arc;

#[tokio::test]
async fn setup_page_shows_signed_in_name() {
    let app = spawn_app().await;

    let response = app.get("/setup", As::Dev("alice")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("alice"));
}

#[tokio::test]
async fn anonymous_setup_is_rejected() {
    let app = spawn_app().await;

    let response = app.post_form("/setup", As::Anonymous, "name=Main&id=main").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains(SIGN_IN_MESSAGE));
    assert!(app.state.storage.get_server("main").await.unwrap().is_none());
}

#[tokio::test]
async fn setup_creates_server_and_administrator() {
    let app = spawn_app().await;

    let response = app.post_form("/setup", As::Dev("alice"), "name=Main&id=main").await;
    assert_redirect(&response, "/servers/main/settings");

    let server = app.state.storage.get_server("main").await.unwrap().unwrap();
    assert_eq!(server.name, "Main");

    let response = app.get("/servers/main/settings", As::Dev("alice")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("task-list"));
}

#[tokio::test]
async fn setup_generates_id_when_blank() {
    let app = spawn_app().await;

    let response = app.post_form("/setup", As::Dev("alice"), "name=Main&id=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap();
    let id = location
        .strip_prefix("/servers/")
        .and_then(|rest| rest.strip_suffix("/settings"))
        .unwrap();
    assert!(!id.is_empty());

    let server = app.state.storage.get_server(id).await.unwrap().unwrap();
    assert_eq!(server.name, "Main");
    let alice = app
        .state
        .storage
        .get_user(Some("alice"), Some(id))
        .await
        .unwrap()
        .unwrap();
    assert!(alice.is_administrator);
}

#[tokio::test]
async fn failed_setup_leaves_no_server_behind() {
    let storage = Arc::new(FlakyStorage::default());
    let app = spawn_app_with_storage(storage.clone());

    storage.set_offline(true);
    let response = app.post_form("/setup", As::Dev("alice"), "name=Main&id=main").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    storage.set_offline(false);
    assert!(storage.inner.get_server("main").await.unwrap().is_none());

    // The id is still free, and the retry yields a server alice administers
    let response = app.post_form("/setup", As::Dev("alice"), "name=Main&id=main").await;
    assert_redirect(&response, "/servers/main/settings");

    let response = app.get("/servers/main/settings", As::Dev("alice")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("task-list"));
}

#[tokio::test]
async fn duplicate_server_id_conflicts() {
    let app = spawn_app().await;
    app.seed_server("main", "Existing").await;

    let response = app.post_form("/setup", As::Dev("alice"), "name=Main&id=main").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_string(response).await.contains("already exists"));

    // The existing server keeps its name and gains no administrator
    let server = app.state.storage.get_server("main").await.unwrap().unwrap();
    assert_eq!(server.name, "Existing");
    let user = app
        .state
        .storage
        .get_user(Some("alice"), Some("main"))
        .await
        .unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let app = spawn_app().await;

    let response = app.post_form("/setup", As::Dev("alice"), "name=&id=main").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post_form("/setup", As::Dev("alice"), "name=Main&id=bad%2Fid")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(response).await.contains("Server ids may only contain"));

    assert!(app.state.storage.get_server("main").await.unwrap().is_none());
    assert!(app.state.storage.get_server("bad/id").await.unwrap().is_none());
}
