//! Maps identities to the rooms they join and events to the rooms that
//! receive them.

use crate::identity::domain::Role;
use crate::identity::ports::VerifiedIdentity;
use crate::realtime::domain::{
    DashboardAudience, DomainEvent, EventKind, EventScope, EventTopic, RoomName,
};
use thiserror::Error;

/// Event that cannot be routed. Always a programming error.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// The event's kind and scope belong to different topics.
    #[error("event {kind} carries a scope of the wrong topic: {scope:?}")]
    ScopeMismatch {
        /// Kind of the rejected event.
        kind: EventKind,
        /// Scope it carried.
        scope: EventScope,
    },
}

/// Deterministic room selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomRouter;

impl RoomRouter {
    /// Creates a router.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Rooms a freshly authenticated connection joins.
    #[must_use]
    pub fn rooms_for_identity(&self, identity: &VerifiedIdentity) -> Vec<RoomName> {
        let mut rooms = vec![
            RoomName::Broadcast,
            RoomName::User(identity.id),
            RoomName::Role(identity.role),
        ];
        if identity.role == Role::Manager {
            rooms.push(RoomName::Manager(identity.id));
        }
        rooms
    }

    /// Rooms that must receive `event`, in delivery order. Never empty.
    ///
    /// Task events go to the creating manager's room only. User events go to
    /// every authenticated connection, plus the affected user's room when the
    /// event addresses them.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::ScopeMismatch`] when the kind and scope
    /// disagree, rather than dropping the event.
    pub fn route(&self, event: &DomainEvent) -> Result<Vec<RoomName>, RoutingError> {
        match (event.kind().topic(), event.scope()) {
            (EventTopic::Task, EventScope::Task { manager }) => Ok(vec![RoomName::Manager(manager)]),
            (EventTopic::User, EventScope::User { affected }) => {
                let mut rooms = vec![RoomName::Broadcast];
                rooms.extend(affected.map(RoomName::User));
                Ok(rooms)
            }
            (EventTopic::Dashboard, EventScope::Dashboard(audience)) => Ok(vec![match audience {
                DashboardAudience::Admins => RoomName::Role(Role::Admin),
                DashboardAudience::Manager(manager) => RoomName::Manager(manager),
                DashboardAudience::Member(member) => RoomName::User(member),
            }]),
            (_, scope) => Err(RoutingError::ScopeMismatch {
                kind: event.kind(),
                scope,
            }),
        }
    }
}
