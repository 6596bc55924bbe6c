//! Connection identifiers and the connection state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of one transport-level connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random connection identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a connection identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Transport is open but no credential has been accepted yet.
    #[default]
    Unauthenticated,
    /// Credential verified; the connection is registered and in its rooms.
    Authenticated,
    /// Connection closed. Terminal.
    Disconnected,
}

impl ConnectionState {
    /// Returns whether `next` is reachable from this state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unauthenticated, Self::Authenticated | Self::Disconnected)
                | (Self::Authenticated, Self::Disconnected)
        )
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConnectionTransition`] when `next` is not reachable.
    pub fn transition_to(&mut self, next: Self) -> Result<(), InvalidConnectionTransition> {
        if !self.can_transition_to(next) {
            return Err(InvalidConnectionTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

/// Rejected connection state change.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("connection cannot move from {from:?} to {to:?}")]
pub struct InvalidConnectionTransition {
    /// State before the request.
    pub from: ConnectionState,
    /// Requested state.
    pub to: ConnectionState,
}
