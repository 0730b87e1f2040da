//! Caller identity resolution
//!
//! Credentials are pulled out of the request by the [`Credentials`]
//! extractor and turned into an [`Identity`] by an [`IdentityResolver`].
//! An unauthenticated request is a valid state, not an error.

pub mod jwt;

pub use jwt::{AuthError, Claims, JwtService};

use crate::AppState;
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use serverdesk_core::Identity;
use tracing::debug;

/// Cookie carrying the session token for browser requests
pub const SESSION_COOKIE: &str = "serverdesk_session";

/// Header accepted as the caller's name in development mode
pub const DEV_USER_HEADER: &str = "x-user-name";

/// Raw credentials presented with a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Anonymous,
    /// A session token, from the `Authorization` header or session cookie
    Token(String),
    /// A plain name, only honoured in development mode
    DevUser(String),
}

impl Credentials {
    /// Extract credentials from request headers
    pub fn from_headers(headers: &HeaderMap, dev_mode: bool) -> Self {
        if let Some(token) = bearer_token(headers) {
            return Self::Token(token);
        }

        if let Some(token) = session_cookie(headers) {
            return Self::Token(token);
        }

        if dev_mode {
            if let Some(name) = headers
                .get(DEV_USER_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|name| !name.is_empty())
            {
                return Self::DevUser(name.to_string());
            }
        }

        Self::Anonymous
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(unquote)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
}

/// Cookie values may be sent as a quoted string
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

impl<S> FromRequestParts<S> for Credentials
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        Ok(Self::from_headers(&parts.headers, app_state.config.dev_mode))
    }
}

/// Resolves the current caller from request credentials
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` means unauthenticated. `Err` is reserved for resolver faults.
    async fn resolve(&self, credentials: &Credentials) -> Result<Option<Identity>, AuthError>;
}

/// Resolves identities from signed session tokens
pub struct JwtIdentityResolver {
    jwt: JwtService,
}

impl JwtIdentityResolver {
    pub fn new(jwt: JwtService) -> Self {
        Self { jwt }
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, credentials: &Credentials) -> Result<Option<Identity>, AuthError> {
        match credentials {
            Credentials::Anonymous => Ok(None),
            Credentials::DevUser(name) => Ok(Some(Identity::new(name.clone()))),
            Credentials::Token(token) => match self.jwt.verify(token) {
                Ok(claims) => Ok(Some(Identity::new(claims.sub))),
                Err(e) => {
                    // A bad or expired token is just an unauthenticated request
                    debug!("Ignoring session token: {}", e);
                    Ok(None)
                }
            },
        }
    }
}
