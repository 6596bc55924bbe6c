//! Domain model for connections, rooms and events.

mod connection;
mod event;
mod room;

pub use connection::{ConnectionId, ConnectionState, InvalidConnectionTransition};
pub use event::{
    ConnectionConfirmation, DashboardAudience, DomainEvent, EventData, EventKind, EventScope,
    EventTopic, PerformedBy, TaskEventData, TaskSnapshot, UserAction, UserEventData,
};
pub use room::{ParseRoomNameError, RoomName};
