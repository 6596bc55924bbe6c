//! Hub command processing.

use super::helpers::{actor_for, drain_frames, event_types, identity, project_task, sink};
use crate::dashboard::domain::{AdminDashboard, DashboardSnapshot, RoleCounts, StatusCounts};
use crate::dashboard::ports::MockSnapshotProvider;
use crate::identity::domain::{Role, UserSummary};
use crate::realtime::adapters::SocketFrame;
use crate::realtime::domain::{ConnectionId, DomainEvent, EventKind, RoomName, UserAction};
use crate::realtime::services::{HubCommand, RealtimeHub, UserEventPublisher, hub_channel};
use chrono::Utc;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn hub() -> RealtimeHub<DefaultClock> {
    RealtimeHub::new(Arc::new(DefaultClock))
}

#[rstest]
fn registration_joins_derived_rooms_and_confirms(mut hub: RealtimeHub<DefaultClock>) {
    let manager = identity(Role::Manager);
    let connection = ConnectionId::new();
    let (socket, mut frames) = sink();

    hub.handle(HubCommand::Register {
        connection_id: connection,
        identity: manager.clone(),
        sink: socket,
    });

    let rooms = hub.registry().rooms_of(connection).expect("registered");
    assert!(rooms.contains(&RoomName::Broadcast));
    assert!(rooms.contains(&RoomName::Role(Role::Manager)));
    assert!(rooms.contains(&RoomName::Manager(manager.id)));
    let confirmation = drain_frames(&mut frames).pop().expect("confirmation sent");
    assert_eq!(confirmation["eventType"], "CONNECTED");
    assert_eq!(confirmation["email"], manager.email.as_str());
    assert_eq!(confirmation["role"], "MANAGER");
}

#[rstest]
fn repeated_registration_sends_one_confirmation(mut hub: RealtimeHub<DefaultClock>) {
    let member = identity(Role::Member);
    let connection = ConnectionId::new();
    let (socket, mut frames) = sink();

    for _ in 0..2 {
        hub.handle(HubCommand::Register {
            connection_id: connection,
            identity: member.clone(),
            sink: socket.clone(),
        });
    }

    assert_eq!(event_types(&mut frames), vec!["CONNECTED".to_owned()]);
    assert_eq!(hub.registry().len(), 1);
}

#[rstest]
fn unregister_stops_delivery(mut hub: RealtimeHub<DefaultClock>) {
    let manager = identity(Role::Manager);
    let member = identity(Role::Member);
    let connection = ConnectionId::new();
    let (socket, mut frames) = sink();
    hub.handle(HubCommand::Register {
        connection_id: connection,
        identity: manager.clone(),
        sink: socket,
    });
    drain_frames(&mut frames);

    hub.handle(HubCommand::Unregister {
        connection_id: connection,
    });
    let task = project_task(manager.id, member.id);
    let event = DomainEvent::for_task(
        EventKind::TaskCreated,
        &task,
        &actor_for(&manager),
        Vec::new(),
        task.creation_deltas(),
        Utc::now(),
    )
    .expect("project tasks produce events");
    hub.handle(HubCommand::Publish(Box::new(event)));

    assert!(hub.registry().is_empty());
    assert!(event_types(&mut frames).is_empty());
}

#[rstest]
fn disconnect_user_closes_every_session(mut hub: RealtimeHub<DefaultClock>) {
    let member = identity(Role::Member);
    let (first, mut first_frames) = sink();
    let (second, mut second_frames) = sink();
    for socket in [first, second] {
        hub.handle(HubCommand::Register {
            connection_id: ConnectionId::new(),
            identity: member.clone(),
            sink: socket,
        });
    }

    hub.handle(HubCommand::DisconnectUser { user: member.id });

    assert!(hub.registry().is_empty());
    for frames in [&mut first_frames, &mut second_frames] {
        let mut last = None;
        while let Ok(frame) = frames.try_recv() {
            last = Some(frame);
        }
        assert_eq!(last, Some(SocketFrame::Close));
    }
}

#[tokio::test]
async fn run_processes_commands_until_handles_drop() {
    let (handle, commands) = hub_channel();
    let hub = RealtimeHub::new(Arc::new(DefaultClock));
    let worker = tokio::spawn(hub.run(commands));
    let admin = identity(Role::Admin);
    let member = identity(Role::Member);
    let (admin_socket, mut admin_frames) = sink();
    let (member_socket, mut member_frames) = sink();
    handle
        .register(ConnectionId::new(), admin.clone(), admin_socket)
        .expect("hub running");
    handle
        .register(ConnectionId::new(), member.clone(), member_socket)
        .expect("hub running");

    let subject = UserSummary::new(member.id, member.email.clone(), member.name.clone(), Role::Member);
    UserEventPublisher::new(handle.clone(), Arc::new(DefaultClock))
        .publish_user_event(UserAction::Deactivated, &subject, &actor_for(&admin))
        .await;
    drop(handle);
    worker.await.expect("hub task completes");

    assert_eq!(
        event_types(&mut admin_frames),
        vec!["CONNECTED".to_owned(), "USER_EVENT".to_owned()]
    );
    // Broadcast and personal room overlap; the subject still gets one copy.
    let member_events = drain_frames(&mut member_frames);
    let kinds: Vec<_> = member_events
        .iter()
        .filter_map(|frame| frame["eventType"].as_str())
        .collect();
    assert_eq!(kinds, vec!["CONNECTED", "USER_EVENT"]);
    assert_eq!(member_events[1]["data"]["action"], "DEACTIVATED");
}

#[tokio::test]
async fn publishing_after_shutdown_is_dropped_quietly() {
    let (handle, commands) = hub_channel();
    drop(commands);

    let admin = identity(Role::Admin);
    let subject = UserSummary::new(admin.id, admin.email.clone(), admin.name.clone(), Role::Admin);
    UserEventPublisher::new(handle.clone(), Arc::new(DefaultClock))
        .publish_user_event(UserAction::Login, &subject, &actor_for(&admin))
        .await;

    assert!(handle.is_closed());
    assert!(handle.unregister(ConnectionId::new()).is_err());
}

#[tokio::test]
async fn user_events_refresh_the_admin_dashboard_only_for_admins() {
    let (handle, commands) = hub_channel();
    let worker = tokio::spawn(RealtimeHub::new(Arc::new(DefaultClock)).run(commands));
    let admin = identity(Role::Admin);
    let manager = identity(Role::Manager);
    let (admin_socket, mut admin_frames) = sink();
    let (manager_socket, mut manager_frames) = sink();
    handle
        .register(ConnectionId::new(), admin.clone(), admin_socket)
        .expect("hub running");
    handle
        .register(ConnectionId::new(), manager.clone(), manager_socket)
        .expect("hub running");

    let mut dashboards = MockSnapshotProvider::new();
    dashboards
        .expect_snapshot()
        .withf(|role, scope| *role == Role::Admin && scope.is_none())
        .times(1)
        .returning(|_, _| {
            Ok(DashboardSnapshot::Admin(AdminDashboard {
                total_users: 3,
                active_users: 3,
                users_by_role: RoleCounts::default(),
                total_tasks: 0,
                tasks_by_status: StatusCounts::default(),
                recent_tasks: Vec::new(),
                last_updated: Utc::now(),
            }))
        });
    let subject = UserSummary::new(
        manager.id,
        manager.email.clone(),
        manager.name.clone(),
        Role::Manager,
    );
    UserEventPublisher::new(handle.clone(), Arc::new(DefaultClock))
        .with_dashboards(Arc::new(dashboards))
        .publish_user_event(UserAction::ProfileUpdated, &subject, &actor_for(&admin))
        .await;
    drop(handle);
    worker.await.expect("hub task completes");

    let admin_received = drain_frames(&mut admin_frames);
    let admin_kinds: Vec<_> = admin_received
        .iter()
        .filter_map(|frame| frame["eventType"].as_str())
        .collect();
    assert_eq!(admin_kinds, vec!["CONNECTED", "USER_EVENT", "DASHBOARD_UPDATED"]);
    assert_eq!(
        event_types(&mut manager_frames),
        vec!["CONNECTED".to_owned(), "USER_EVENT".to_owned()]
    );
}
