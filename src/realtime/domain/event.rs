//! Domain events and their wire envelope.

use crate::dashboard::domain::DashboardSnapshot;
use crate::identity::domain::{Actor, Role, UserId, UserSummary};
use crate::identity::ports::VerifiedIdentity;
use crate::task::domain::{
    CounterDeltas, FieldChange, Task, TaskId, TaskPriority, TaskStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed topic families. This is not a general pub/sub system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// Task lifecycle events.
    Task,
    /// User lifecycle events.
    User,
    /// Dashboard snapshots.
    Dashboard,
}

/// Event kinds pushed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A project task was created.
    TaskCreated,
    /// A project task changed status.
    TaskStatusChanged,
    /// A project task changed priority.
    TaskPriorityChanged,
    /// A project task's due date changed.
    TaskDueDateChanged,
    /// A project task was reassigned.
    TaskAssigned,
    /// A project task was completed.
    TaskCompleted,
    /// A project task's title or description changed.
    TaskUpdated,
    /// A project task was deleted.
    TaskDeleted,
    /// A user lifecycle event; see [`UserAction`].
    UserEvent,
    /// A recomputed dashboard snapshot.
    DashboardUpdated,
}

impl EventKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "TASK_CREATED",
            Self::TaskStatusChanged => "TASK_STATUS_CHANGED",
            Self::TaskPriorityChanged => "TASK_PRIORITY_CHANGED",
            Self::TaskDueDateChanged => "TASK_DUE_DATE_CHANGED",
            Self::TaskAssigned => "TASK_ASSIGNED",
            Self::TaskCompleted => "TASK_COMPLETED",
            Self::TaskUpdated => "TASK_UPDATED",
            Self::TaskDeleted => "TASK_DELETED",
            Self::UserEvent => "USER_EVENT",
            Self::DashboardUpdated => "DASHBOARD_UPDATED",
        }
    }

    /// Returns the topic family of the kind.
    #[must_use]
    pub const fn topic(self) -> EventTopic {
        match self {
            Self::TaskCreated
            | Self::TaskStatusChanged
            | Self::TaskPriorityChanged
            | Self::TaskDueDateChanged
            | Self::TaskAssigned
            | Self::TaskCompleted
            | Self::TaskUpdated
            | Self::TaskDeleted => EventTopic::Task,
            Self::UserEvent => EventTopic::User,
            Self::DashboardUpdated => EventTopic::Dashboard,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-action carried by [`EventKind::UserEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserAction {
    /// User signed in.
    Login,
    /// User signed out.
    Logout,
    /// Profile fields changed.
    ProfileUpdated,
    /// Account activated.
    Activated,
    /// Account deactivated.
    Deactivated,
    /// Password reset.
    PasswordReset,
    /// Account created.
    Created,
    /// Account deleted.
    Deleted,
    /// Role changed.
    RoleChanged,
}

impl UserAction {
    /// Returns whether the affected user's own room also receives the event.
    #[must_use]
    pub const fn notifies_subject(self) -> bool {
        matches!(
            self,
            Self::ProfileUpdated
                | Self::Activated
                | Self::Deactivated
                | Self::PasswordReset
                | Self::RoleChanged
        )
    }

    /// Returns whether the affected user's live sessions must end, because
    /// their room memberships or access no longer hold.
    #[must_use]
    pub const fn ends_sessions(self) -> bool {
        matches!(self, Self::Deactivated | Self::Deleted | Self::RoleChanged)
    }
}

/// Attribution block included in every payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformedBy {
    /// Acting user.
    pub user_id: UserId,
    /// Acting user's display name.
    pub user_name: String,
    /// Acting user's role.
    pub role: Role,
}

impl From<&Actor> for PerformedBy {
    fn from(actor: &Actor) -> Self {
        Self {
            user_id: actor.id,
            user_name: actor.name.clone(),
            role: actor.role,
        }
    }
}

/// Audience of a dashboard snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardAudience {
    /// Every administrator.
    Admins,
    /// One manager's subtree.
    Manager(UserId),
    /// One member.
    Member(UserId),
}

/// Scoping information the router uses to pick rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventScope {
    /// Project task created by `manager`.
    Task {
        /// Creator of the task.
        manager: UserId,
    },
    /// User lifecycle event, optionally addressed to the affected user too.
    User {
        /// User whose personal room also receives the event.
        affected: Option<UserId>,
    },
    /// Dashboard snapshot for one audience.
    Dashboard(DashboardAudience),
}

/// Task fields exposed in task event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    /// Task identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Status.
    pub status: TaskStatus,
    /// Priority.
    pub priority: TaskPriority,
    /// Due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Creator.
    pub created_by: UserId,
    /// Assignee.
    pub assigned_to: UserId,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_owned(),
            status: task.status(),
            priority: task.priority(),
            due_date: task.due_date(),
            created_by: task.created_by(),
            assigned_to: task.assigned_to(),
            updated_at: task.updated_at(),
        }
    }
}

/// Payload of task events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEventData {
    /// Task state after the change.
    pub task: TaskSnapshot,
    /// Field changes behind this event.
    pub changes: Vec<FieldChange>,
    /// Advisory counter deltas for optimistic UI updates.
    pub counters: CounterDeltas,
}

/// Payload of user events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventData {
    /// What happened.
    pub action: UserAction,
    /// Affected user.
    pub user_id: UserId,
    /// Affected user's e-mail.
    pub email: String,
    /// Affected user's display name.
    pub name: String,
    /// Affected user's role after the event.
    pub role: Role,
    /// Affected user's active flag after the event.
    pub active: bool,
}

/// Event payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    /// Task event payload.
    Task(TaskEventData),
    /// User event payload.
    User(UserEventData),
    /// Dashboard snapshot payload.
    Dashboard(Box<DashboardSnapshot>),
}

/// A domain event ready for routing.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    kind: EventKind,
    scope: EventScope,
    performed_by: PerformedBy,
    occurred_at: DateTime<Utc>,
    data: EventData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventEnvelope<'a> {
    event_type: EventKind,
    timestamp: DateTime<Utc>,
    performed_by: &'a PerformedBy,
    data: &'a EventData,
}

impl DomainEvent {
    /// Creates an event for a project task.
    ///
    /// Returns `None` for personal tasks: they are private and have no room.
    #[must_use]
    pub fn for_task(
        kind: EventKind,
        task: &Task,
        actor: &Actor,
        changes: Vec<FieldChange>,
        counters: CounterDeltas,
        occurred_at: DateTime<Utc>,
    ) -> Option<Self> {
        if task.is_personal() {
            return None;
        }
        Some(Self {
            kind,
            scope: EventScope::Task {
                manager: task.created_by(),
            },
            performed_by: PerformedBy::from(actor),
            occurred_at,
            data: EventData::Task(TaskEventData {
                task: TaskSnapshot::from(task),
                changes,
                counters,
            }),
        })
    }

    /// Creates a user lifecycle event. When `notify_subject` is set the
    /// affected user's personal room receives it as well.
    #[must_use]
    pub fn for_user(
        action: UserAction,
        subject: &UserSummary,
        actor: &Actor,
        notify_subject: bool,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: EventKind::UserEvent,
            scope: EventScope::User {
                affected: notify_subject.then_some(subject.id()),
            },
            performed_by: PerformedBy::from(actor),
            occurred_at,
            data: EventData::User(UserEventData {
                action,
                user_id: subject.id(),
                email: subject.email().to_owned(),
                name: subject.name().to_owned(),
                role: subject.role(),
                active: subject.is_active(),
            }),
        }
    }

    /// Creates a dashboard snapshot event for `audience`.
    #[must_use]
    pub fn for_dashboard(
        snapshot: DashboardSnapshot,
        audience: DashboardAudience,
        actor: &Actor,
    ) -> Self {
        Self {
            kind: EventKind::DashboardUpdated,
            scope: EventScope::Dashboard(audience),
            performed_by: PerformedBy::from(actor),
            occurred_at: snapshot.last_updated(),
            data: EventData::Dashboard(Box::new(snapshot)),
        }
    }

    /// Assembles an event from raw parts without consistency checks. The
    /// router rejects combinations whose kind and scope disagree.
    #[must_use]
    pub const fn from_parts(
        kind: EventKind,
        scope: EventScope,
        performed_by: PerformedBy,
        occurred_at: DateTime<Utc>,
        data: EventData,
    ) -> Self {
        Self {
            kind,
            scope,
            performed_by,
            occurred_at,
            data,
        }
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the routing scope.
    #[must_use]
    pub const fn scope(&self) -> EventScope {
        self.scope
    }

    /// Returns the attribution block.
    #[must_use]
    pub const fn performed_by(&self) -> &PerformedBy {
        &self.performed_by
    }

    /// Returns when the event occurred.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns the payload.
    #[must_use]
    pub const fn data(&self) -> &EventData {
        &self.data
    }

    /// Serializes the wire envelope
    /// `{eventType, timestamp, performedBy, data}`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the payload cannot be encoded.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&EventEnvelope {
            event_type: self.kind,
            timestamp: self.occurred_at,
            performed_by: &self.performed_by,
            data: &self.data,
        })
    }
}

/// First frame sent on a freshly authenticated connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfirmation {
    /// Always `CONNECTED`.
    pub event_type: &'static str,
    /// When the connection was authenticated.
    pub timestamp: DateTime<Utc>,
    /// Authenticated user.
    pub id: UserId,
    /// Authenticated user's e-mail.
    pub email: String,
    /// Authenticated user's role.
    pub role: Role,
}

impl ConnectionConfirmation {
    /// Builds the confirmation for `identity`.
    #[must_use]
    pub fn new(identity: &VerifiedIdentity, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: "CONNECTED",
            timestamp,
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
        }
    }

    /// Serializes the confirmation frame.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if encoding fails.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
