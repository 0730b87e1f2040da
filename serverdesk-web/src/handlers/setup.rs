//! Server setup flow
//!
//! Signed-in callers create a server here and become its first
//! administrator.

use super::{settings_path, types::SetupForm};
use crate::{
    auth::Credentials,
    templates::{HtmlTemplate, SetupTemplate},
    AppState, WebResult,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serverdesk_core::{Server, ServerUser, StorageError};
use tracing::info;
use uuid::Uuid;

pub const SIGN_IN_MESSAGE: &str = "Sign in to set up a server.";

const MAX_SERVER_ID_LEN: usize = 64;

pub async fn setup_page(
    State(state): State<AppState>,
    credentials: Credentials,
) -> WebResult<HtmlTemplate<SetupTemplate>> {
    let me = state.identity.resolve(&credentials).await?;
    Ok(HtmlTemplate(SetupTemplate::new(me.as_ref())))
}

pub async fn submit_setup(
    State(state): State<AppState>,
    credentials: Credentials,
    Form(form): Form<SetupForm>,
) -> WebResult<Response> {
    let me = state.identity.resolve(&credentials).await?;
    let name = form.name.trim();
    let requested_id = form.id.as_deref().map(str::trim).unwrap_or_default();

    let form_again = |status: StatusCode, error: String| {
        let page = SetupTemplate::new(me.as_ref())
            .with_values(name, requested_id)
            .with_error(error);
        (status, HtmlTemplate(page)).into_response()
    };

    let Some(admin) = me.as_ref() else {
        return Ok(form_again(StatusCode::UNAUTHORIZED, SIGN_IN_MESSAGE.to_string()));
    };

    if name.is_empty() {
        return Ok(form_again(
            StatusCode::UNPROCESSABLE_ENTITY,
            "A server name is required.".to_string(),
        ));
    }

    let id = if requested_id.is_empty() {
        Uuid::new_v4().to_string()
    } else if is_valid_server_id(requested_id) {
        requested_id.to_string()
    } else {
        return Ok(form_again(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Server ids may only contain letters, digits, '-' and '_'.".to_string(),
        ));
    };

    let server = Server::new(id, name);
    let membership = ServerUser::administrator(&admin.name, &server.id);
    match state
        .storage
        .create_server_with_admin(&server, &membership)
        .await
    {
        Ok(()) => {}
        Err(StorageError::Conflict(_)) => {
            return Ok(form_again(
                StatusCode::CONFLICT,
                format!("Server {} already exists.", server.id),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    info!("{} set up server {}", admin.name, server.id);

    Ok(Redirect::to(&settings_path(&server.id)).into_response())
}

fn is_valid_server_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SERVER_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_id_validation() {
        assert!(is_valid_server_id("srv-1_a"));
        assert!(!is_valid_server_id(""));
        assert!(!is_valid_server_id("a/b"));
        assert!(!is_valid_server_id("has space"));
        assert!(!is_valid_server_id(&"x".repeat(MAX_SERVER_ID_LEN + 1)));
    }
}
