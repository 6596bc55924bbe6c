//! Connection registry bookkeeping.

use super::helpers::{identity, sink};
use crate::identity::domain::Role;
use crate::realtime::domain::{ConnectionId, RoomName};
use crate::realtime::services::{ConnectionRegistry, Registration, RegistryError};
use rstest::{fixture, rstest};

#[fixture]
fn registry() -> ConnectionRegistry {
    ConnectionRegistry::new()
}

#[rstest]
fn unregister_removes_connection_from_every_room(mut registry: ConnectionRegistry) {
    let manager = identity(Role::Manager);
    let connection = ConnectionId::new();
    let (socket, _frames) = sink();
    registry.register(connection, manager.clone(), socket);
    for room in [
        RoomName::Broadcast,
        RoomName::User(manager.id),
        RoomName::Manager(manager.id),
    ] {
        registry.join_room(connection, room).expect("registered");
    }

    let removed = registry.unregister(connection);

    assert_eq!(removed, Some(manager.clone()));
    assert!(registry.is_empty());
    assert_eq!(registry.room_count(), 0);
    assert!(registry.members_of(RoomName::Manager(manager.id)).is_empty());
    assert_eq!(registry.rooms_of(connection), None);
}

#[rstest]
fn registering_twice_with_same_identity_is_a_no_op(mut registry: ConnectionRegistry) {
    let member = identity(Role::Member);
    let connection = ConnectionId::new();
    let (socket, _frames) = sink();

    let first = registry.register(connection, member.clone(), socket.clone());
    registry
        .join_room(connection, RoomName::Broadcast)
        .expect("registered");
    let second = registry.register(connection, member, socket);

    assert_eq!(first, Registration::Created);
    assert_eq!(second, Registration::Unchanged);
    assert_eq!(registry.len(), 1);
    assert!(registry.members_of(RoomName::Broadcast).contains(&connection));
}

#[rstest]
fn registering_with_a_new_identity_drops_old_memberships(mut registry: ConnectionRegistry) {
    let old = identity(Role::Manager);
    let new = identity(Role::Member);
    let connection = ConnectionId::new();
    let (socket, _frames) = sink();
    registry.register(connection, old.clone(), socket.clone());
    registry
        .join_room(connection, RoomName::Manager(old.id))
        .expect("registered");

    let outcome = registry.register(connection, new.clone(), socket);

    assert_eq!(outcome, Registration::Replaced);
    assert_eq!(registry.identity_of(connection), Some(&new));
    assert!(registry.members_of(RoomName::Manager(old.id)).is_empty());
}

#[rstest]
fn joining_is_idempotent(mut registry: ConnectionRegistry) {
    let member = identity(Role::Member);
    let connection = ConnectionId::new();
    let (socket, _frames) = sink();
    registry.register(connection, member, socket);

    assert_eq!(registry.join_room(connection, RoomName::Broadcast), Ok(true));
    assert_eq!(registry.join_room(connection, RoomName::Broadcast), Ok(false));
    assert_eq!(registry.members_of(RoomName::Broadcast).len(), 1);
}

#[rstest]
fn leaving_the_last_member_removes_the_room(mut registry: ConnectionRegistry) {
    let member = identity(Role::Member);
    let connection = ConnectionId::new();
    let (socket, _frames) = sink();
    registry.register(connection, member.clone(), socket);
    registry
        .join_room(connection, RoomName::User(member.id))
        .expect("registered");

    assert_eq!(registry.leave_room(connection, RoomName::User(member.id)), Ok(true));
    assert_eq!(registry.leave_room(connection, RoomName::User(member.id)), Ok(false));
    assert_eq!(registry.room_count(), 0);
}

#[rstest]
fn unknown_connections_cannot_join_rooms(mut registry: ConnectionRegistry) {
    let connection = ConnectionId::new();

    let result = registry.join_room(connection, RoomName::Broadcast);

    assert_eq!(result, Err(RegistryError::UnknownConnection(connection)));
    assert_eq!(registry.room_count(), 0);
}

#[rstest]
fn connections_of_lists_every_session_of_a_user(mut registry: ConnectionRegistry) {
    let member = identity(Role::Member);
    let other = identity(Role::Member);
    let (socket, _frames) = sink();
    let first = ConnectionId::new();
    let second = ConnectionId::new();
    registry.register(first, member.clone(), socket.clone());
    registry.register(second, member.clone(), socket.clone());
    registry.register(ConnectionId::new(), other, socket);

    let sessions = registry.connections_of(member.id);

    assert_eq!(sessions.len(), 2);
    assert!(sessions.contains(&first) && sessions.contains(&second));
}
