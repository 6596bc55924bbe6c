//! In-memory bookkeeping of live connections and their rooms.
//!
//! The registry is plain data behind `&mut self`. It is owned by the hub,
//! which applies one command at a time, so no locking is needed and every
//! call is atomic relative to the others.

use crate::identity::domain::UserId;
use crate::identity::ports::VerifiedIdentity;
use crate::realtime::domain::{ConnectionId, RoomName};
use crate::realtime::ports::ConnectionSink;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Outcome of [`ConnectionRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new connection was recorded.
    Created,
    /// The connection was already registered with the same identity.
    Unchanged,
    /// The connection was registered with a different identity; its old
    /// memberships were dropped.
    Replaced,
}

/// Errors returned by registry operations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The connection is not registered.
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
}

struct ConnectionEntry {
    identity: VerifiedIdentity,
    rooms: BTreeSet<RoomName>,
    sink: Arc<dyn ConnectionSink>,
}

/// Registry of authenticated connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<RoomName, BTreeSet<ConnectionId>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection. Registering the same id and identity again is a
    /// no-op.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        identity: VerifiedIdentity,
        sink: Arc<dyn ConnectionSink>,
    ) -> Registration {
        let same_identity = self
            .connections
            .get(&connection_id)
            .map(|entry| entry.identity == identity);
        let outcome = match same_identity {
            Some(true) => return Registration::Unchanged,
            Some(false) => {
                self.unregister(connection_id);
                Registration::Replaced
            }
            None => Registration::Created,
        };
        debug!(%connection_id, user_id = %identity.id, "connection registered");
        self.connections.insert(
            connection_id,
            ConnectionEntry {
                identity,
                rooms: BTreeSet::new(),
                sink,
            },
        );
        outcome
    }

    /// Removes a connection and every membership it held. Returns the
    /// identity it was registered with, if any.
    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<VerifiedIdentity> {
        let entry = self.connections.remove(&connection_id)?;
        for room in &entry.rooms {
            self.remove_member(*room, connection_id);
        }
        debug!(%connection_id, rooms = entry.rooms.len(), "connection unregistered");
        Some(entry.identity)
    }

    /// Adds a connection to a room. Returns `false` if it was already a
    /// member.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownConnection`] for unregistered ids.
    pub fn join_room(
        &mut self,
        connection_id: ConnectionId,
        room: RoomName,
    ) -> Result<bool, RegistryError> {
        let entry = self
            .connections
            .get_mut(&connection_id)
            .ok_or(RegistryError::UnknownConnection(connection_id))?;
        if !entry.rooms.insert(room) {
            return Ok(false);
        }
        self.rooms.entry(room).or_default().insert(connection_id);
        Ok(true)
    }

    /// Removes a connection from a room. Returns `false` if it was not a
    /// member.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownConnection`] for unregistered ids.
    pub fn leave_room(
        &mut self,
        connection_id: ConnectionId,
        room: RoomName,
    ) -> Result<bool, RegistryError> {
        let entry = self
            .connections
            .get_mut(&connection_id)
            .ok_or(RegistryError::UnknownConnection(connection_id))?;
        if !entry.rooms.remove(&room) {
            return Ok(false);
        }
        self.remove_member(room, connection_id);
        Ok(true)
    }

    fn remove_member(&mut self, room: RoomName, connection_id: ConnectionId) {
        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.rooms.remove(&room);
            }
        }
    }

    /// Returns the connections currently joined to `room`.
    #[must_use]
    pub fn members_of(&self, room: RoomName) -> BTreeSet<ConnectionId> {
        self.rooms.get(&room).cloned().unwrap_or_default()
    }

    /// Returns the rooms a connection has joined.
    #[must_use]
    pub fn rooms_of(&self, connection_id: ConnectionId) -> Option<&BTreeSet<RoomName>> {
        self.connections
            .get(&connection_id)
            .map(|entry| &entry.rooms)
    }

    /// Returns the identity a connection was registered with.
    #[must_use]
    pub fn identity_of(&self, connection_id: ConnectionId) -> Option<&VerifiedIdentity> {
        self.connections
            .get(&connection_id)
            .map(|entry| &entry.identity)
    }

    /// Returns the outbound sink of a connection.
    #[must_use]
    pub fn sink_of(&self, connection_id: ConnectionId) -> Option<Arc<dyn ConnectionSink>> {
        self.connections
            .get(&connection_id)
            .map(|entry| Arc::clone(&entry.sink))
    }

    /// Returns every connection registered for `user`.
    #[must_use]
    pub fn connections_of(&self, user: UserId) -> BTreeSet<ConnectionId> {
        self.connections
            .iter()
            .filter(|(_, entry)| entry.identity.id == user)
            .map(|(connection_id, _)| *connection_id)
            .collect()
    }

    /// Returns the number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns whether no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Returns the number of non-empty rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
