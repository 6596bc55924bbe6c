//! The single logical actor owning connection state.
//!
//! Services never touch the registry directly. They hold a [`HubHandle`] and
//! send [`HubCommand`]s; the hub applies each command to completion before
//! taking the next, so registry updates never interleave.

use super::{ConnectionRegistry, EventBroadcaster, Registration, RoomRouter};
use crate::identity::domain::UserId;
use crate::identity::ports::VerifiedIdentity;
use crate::realtime::domain::{ConnectionConfirmation, ConnectionId, DomainEvent};
use crate::realtime::ports::ConnectionSink;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Command processed by the hub.
pub enum HubCommand {
    /// Register an authenticated connection and join its rooms.
    Register {
        /// Connection to register.
        connection_id: ConnectionId,
        /// Verified identity behind the connection.
        identity: VerifiedIdentity,
        /// Outbound socket.
        sink: Arc<dyn ConnectionSink>,
    },
    /// Drop a connection and all its memberships.
    Unregister {
        /// Connection to drop.
        connection_id: ConnectionId,
    },
    /// Close and drop every connection of a user, forcing re-authentication.
    DisconnectUser {
        /// User whose sessions end.
        user: UserId,
    },
    /// Route and deliver an event.
    Publish(Box<DomainEvent>),
}

/// The hub has stopped and no longer accepts commands.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("realtime hub is not running")]
pub struct HubClosed;

/// Cloneable sending side of the hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    sender: mpsc::UnboundedSender<HubCommand>,
}

impl std::fmt::Debug for HubCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register { connection_id, .. } => {
                f.debug_struct("Register").field("connection_id", connection_id).finish()
            }
            Self::Unregister { connection_id } => f
                .debug_struct("Unregister")
                .field("connection_id", connection_id)
                .finish(),
            Self::DisconnectUser { user } => {
                f.debug_struct("DisconnectUser").field("user", user).finish()
            }
            Self::Publish(event) => f.debug_tuple("Publish").field(&event.kind()).finish(),
        }
    }
}

impl HubHandle {
    fn send(&self, command: HubCommand) -> Result<(), HubClosed> {
        self.sender.send(command).map_err(|_| HubClosed)
    }

    /// Registers an authenticated connection.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] when the hub has stopped.
    pub fn register(
        &self,
        connection_id: ConnectionId,
        identity: VerifiedIdentity,
        sink: Arc<dyn ConnectionSink>,
    ) -> Result<(), HubClosed> {
        self.send(HubCommand::Register {
            connection_id,
            identity,
            sink,
        })
    }

    /// Unregisters a connection.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] when the hub has stopped.
    pub fn unregister(&self, connection_id: ConnectionId) -> Result<(), HubClosed> {
        self.send(HubCommand::Unregister { connection_id })
    }

    /// Ends every session of `user`.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] when the hub has stopped.
    pub fn disconnect_user(&self, user: UserId) -> Result<(), HubClosed> {
        self.send(HubCommand::DisconnectUser { user })
    }

    /// Hands an event to the hub. Never blocks; if the hub has stopped the
    /// event is logged and dropped, since delivery never affects the
    /// mutation that produced it.
    pub fn publish(&self, event: DomainEvent) {
        let kind = event.kind();
        if self.send(HubCommand::Publish(Box::new(event))).is_err() {
            warn!(event = %kind, "realtime hub stopped, event dropped");
        }
    }

    /// Returns whether the hub has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Creates a hub command channel.
#[must_use]
pub fn hub_channel() -> (HubHandle, mpsc::UnboundedReceiver<HubCommand>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (HubHandle { sender }, receiver)
}

/// Owner of the connection registry and broadcaster.
pub struct RealtimeHub<C>
where
    C: Clock + Send + Sync,
{
    registry: ConnectionRegistry,
    router: RoomRouter,
    broadcaster: EventBroadcaster,
    clock: Arc<C>,
}

impl<C> RealtimeHub<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a hub with an empty registry.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        let router = RoomRouter::new();
        Self {
            registry: ConnectionRegistry::new(),
            router,
            broadcaster: EventBroadcaster::new(router),
            clock,
        }
    }

    /// Returns the registry for inspection.
    #[must_use]
    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Processes commands until every [`HubHandle`] is dropped.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<HubCommand>) {
        info!("realtime hub started");
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
        info!(connections = self.registry.len(), "realtime hub stopped");
    }

    /// Applies one command to completion.
    pub fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register {
                connection_id,
                identity,
                sink,
            } => self.register(connection_id, identity, sink),
            HubCommand::Unregister { connection_id } => {
                if let Some(identity) = self.registry.unregister(connection_id) {
                    info!(%connection_id, user_id = %identity.id, "connection closed");
                }
            }
            HubCommand::DisconnectUser { user } => self.disconnect_user(user),
            HubCommand::Publish(event) => match self.broadcaster.publish(&self.registry, &event) {
                Ok(report) => debug!(
                    event = %event.kind(),
                    rooms = report.rooms.len(),
                    delivered = report.delivered.len(),
                    failed = report.failed.len(),
                    "event published"
                ),
                Err(err) => error!(event = %event.kind(), error = %err, "event could not be published"),
            },
        }
    }

    fn register(
        &mut self,
        connection_id: ConnectionId,
        identity: VerifiedIdentity,
        sink: Arc<dyn ConnectionSink>,
    ) {
        let rooms = self.router.rooms_for_identity(&identity);
        let confirmation = ConnectionConfirmation::new(&identity, self.clock.utc());
        let user_id = identity.id;
        let outcome = self
            .registry
            .register(connection_id, identity, Arc::clone(&sink));
        if outcome == Registration::Unchanged {
            return;
        }
        for room in rooms {
            if let Err(err) = self.registry.join_room(connection_id, room) {
                error!(%connection_id, %room, error = %err, "room join failed");
            }
        }
        info!(%connection_id, %user_id, ?outcome, "connection authenticated");

        let delivery = confirmation
            .to_frame()
            .map_err(|err| err.to_string())
            .and_then(|frame| sink.send(&frame).map_err(|err| err.to_string()));
        if let Err(err) = delivery {
            warn!(%connection_id, error = %err, "connection confirmation not delivered");
        }
    }

    fn disconnect_user(&mut self, user: UserId) {
        for connection_id in self.registry.connections_of(user) {
            if let Some(sink) = self.registry.sink_of(connection_id) {
                sink.close();
            }
            self.registry.unregister(connection_id);
            info!(%connection_id, user_id = %user, "connection closed by server");
        }
    }
}
