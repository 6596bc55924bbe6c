//! Best-effort delivery of routed events to live sockets.

use super::{ConnectionRegistry, RoomRouter, RoutingError};
use crate::realtime::domain::{ConnectionId, DomainEvent, RoomName};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

/// Errors that stop an event before any socket is touched.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The event could not be routed.
    #[error(transparent)]
    Routing(#[from] RoutingError),
    /// The payload could not be serialized.
    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Summary of one publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Rooms the event was routed to.
    pub rooms: Vec<RoomName>,
    /// Connections that accepted the frame.
    pub delivered: BTreeSet<ConnectionId>,
    /// Connections whose sink refused the frame.
    pub failed: BTreeSet<ConnectionId>,
}

/// Serializes events once and pushes them to every member of their rooms.
///
/// Nothing is queued or retried: a socket that fails misses the event, and a
/// client that was offline re-fetches a fresh snapshot when it reconnects.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventBroadcaster {
    router: RoomRouter,
}

impl EventBroadcaster {
    /// Creates a broadcaster routing with `router`.
    #[must_use]
    pub const fn new(router: RoomRouter) -> Self {
        Self { router }
    }

    /// Delivers `event` to each connection joined to any of its rooms. A
    /// connection in several target rooms receives the frame once.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError`] when routing or serialization fails.
    /// Per-socket failures are logged and reported, never returned.
    pub fn publish(
        &self,
        registry: &ConnectionRegistry,
        event: &DomainEvent,
    ) -> Result<DeliveryReport, BroadcastError> {
        let rooms = self.router.route(event)?;
        let frame = event.to_frame()?;
        let targets: BTreeSet<ConnectionId> = rooms
            .iter()
            .flat_map(|room| registry.members_of(*room))
            .collect();

        let mut report = DeliveryReport {
            rooms,
            delivered: BTreeSet::new(),
            failed: BTreeSet::new(),
        };
        for connection_id in targets {
            let Some(sink) = registry.sink_of(connection_id) else {
                continue;
            };
            match sink.send(&frame) {
                Ok(()) => {
                    report.delivered.insert(connection_id);
                }
                Err(err) => {
                    warn!(%connection_id, event = %event.kind(), error = %err, "event delivery failed");
                    report.failed.insert(connection_id);
                }
            }
        }
        Ok(report)
    }
}
