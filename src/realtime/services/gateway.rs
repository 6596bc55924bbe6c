//! Authentication handshake for new transport connections.

use super::{HubClosed, HubHandle};
use crate::config::TaskhubConfig;
use crate::identity::ports::{AuthError, CredentialVerifier, VerifiedIdentity};
use crate::realtime::domain::{ConnectionId, ConnectionState, InvalidConnectionTransition};
use crate::realtime::ports::ConnectionSink;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Authentication failed; the socket has been closed.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The session was asked to make an impossible state change.
    #[error(transparent)]
    State(#[from] InvalidConnectionTransition),
    /// The hub has stopped.
    #[error(transparent)]
    HubClosed(#[from] HubClosed),
}

/// One client connection as seen by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSession {
    id: ConnectionId,
    state: ConnectionState,
    identity: Option<VerifiedIdentity>,
}

impl ConnectionSession {
    fn new() -> Self {
        Self {
            id: ConnectionId::new(),
            state: ConnectionState::Unauthenticated,
            identity: None,
        }
    }

    /// Returns the connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the authenticated identity.
    #[must_use]
    pub const fn identity(&self) -> Option<&VerifiedIdentity> {
        self.identity.as_ref()
    }
}

/// Authenticates connections and hands them to the hub.
pub struct ConnectionGateway<V>
where
    V: CredentialVerifier,
{
    verifier: Arc<V>,
    hub: HubHandle,
    auth_timeout: Duration,
}

impl<V> ConnectionGateway<V>
where
    V: CredentialVerifier,
{
    /// Creates a gateway using the configured authentication timeout.
    #[must_use]
    pub fn new(verifier: Arc<V>, hub: HubHandle, config: &TaskhubConfig) -> Self {
        Self {
            verifier,
            hub,
            auth_timeout: config.auth_timeout(),
        }
    }

    /// Runs the handshake for a new connection.
    ///
    /// `credential` resolves when the client presents its token, or to
    /// `None` if the client says it has none. A client that presents nothing
    /// within the timeout is disconnected. The credential is verified once
    /// and never cached. On any failure the sink is closed and nothing is
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Auth`] when authentication fails and
    /// [`GatewayError::HubClosed`] when the hub has stopped.
    pub async fn accept<F>(
        &self,
        sink: Arc<dyn ConnectionSink>,
        credential: F,
    ) -> Result<ConnectionSession, GatewayError>
    where
        F: Future<Output = Option<String>> + Send,
    {
        let mut session = ConnectionSession::new();
        let verified = match tokio::time::timeout(self.auth_timeout, credential).await {
            Err(_) => Err(AuthError::TimedOut(self.auth_timeout)),
            Ok(None) => Err(AuthError::MissingCredential),
            Ok(Some(token)) => self.verifier.verify(&token).await,
        };

        let identity = match verified {
            Ok(identity) => identity,
            Err(err) => {
                warn!(connection_id = %session.id, error = %err, "authentication failed");
                session.state.transition_to(ConnectionState::Disconnected)?;
                sink.close();
                return Err(err.into());
            }
        };

        session.state.transition_to(ConnectionState::Authenticated)?;
        if let Err(err) = self
            .hub
            .register(session.id, identity.clone(), Arc::clone(&sink))
        {
            session.state.transition_to(ConnectionState::Disconnected)?;
            sink.close();
            return Err(err.into());
        }
        info!(
            connection_id = %session.id,
            user_id = %identity.id,
            role = %identity.role,
            "connection accepted"
        );
        session.identity = Some(identity);
        Ok(session)
    }

    /// Ends an authenticated session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::State`] if the session is already
    /// disconnected.
    pub fn disconnect(&self, session: &mut ConnectionSession) -> Result<(), GatewayError> {
        session.state.transition_to(ConnectionState::Disconnected)?;
        if self.hub.unregister(session.id).is_err() {
            warn!(connection_id = %session.id, "realtime hub stopped before disconnect");
        }
        Ok(())
    }
}
