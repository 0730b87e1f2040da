//! Authorization gate for server-scoped settings routes
//!
//! The server record and the caller's identity are resolved concurrently,
//! then the caller's membership in that server decides the outcome. A missing
//! server always redirects to the setup flow, whatever the identity lookup
//! produced.

use crate::{auth::Credentials, auth::IdentityResolver, WebResult};
use serverdesk_core::{Server, Storage};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Where callers land when the requested server does not exist
pub const SETUP_PATH: &str = "/setup";

/// Outcome of evaluating the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The server does not exist; nothing may be rendered
    Redirect { to: &'static str },
    /// The caller administers the server, carried exactly as loaded
    Authorized(Server),
    /// The server exists but the caller is not one of its administrators
    Denied,
}

#[derive(Clone)]
pub struct SettingsGate {
    storage: Arc<dyn Storage>,
    identity: Arc<dyn IdentityResolver>,
}

impl SettingsGate {
    pub fn new(storage: Arc<dyn Storage>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { storage, identity }
    }

    /// Decide what the caller may see for `server_id`.
    ///
    /// Read-only: neither the server nor any membership is modified. Lookup
    /// faults are returned as errors rather than folded into a redirect or a
    /// denial.
    #[instrument(skip(self, credentials))]
    pub async fn evaluate(
        &self,
        server_id: &str,
        credentials: &Credentials,
    ) -> WebResult<GateOutcome> {
        let (server, me) = tokio::join!(
            self.storage.get_server(server_id),
            self.identity.resolve(credentials)
        );

        let Some(server) = server? else {
            info!("Server {} not found, redirecting to setup", server_id);
            return Ok(GateOutcome::Redirect { to: SETUP_PATH });
        };

        let me = me?;
        let name = me.as_ref().map(|identity| identity.name.as_str());
        let user = self.storage.get_user(name, Some(&server.id)).await?;

        if user.is_some_and(|user| user.is_administrator) {
            debug!("{:?} authorized for server {}", name, server.id);
            Ok(GateOutcome::Authorized(server))
        } else {
            debug!("{:?} denied for server {}", name, server.id);
            Ok(GateOutcome::Denied)
        }
    }
}
