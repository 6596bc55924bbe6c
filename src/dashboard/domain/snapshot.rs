//! Computed, non-persisted dashboard snapshots.

use crate::identity::domain::{Role, UserId, UserSummary};
use crate::task::domain::{Task, TaskId, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Task counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    /// Tasks in `TODO`.
    pub todo: usize,
    /// Tasks in `IN_PROGRESS`.
    pub in_progress: usize,
    /// Tasks in `REVIEW`.
    pub review: usize,
    /// Tasks in `COMPLETED`.
    pub completed: usize,
    /// Tasks in `CANCELLED`.
    pub cancelled: usize,
}

impl StatusCounts {
    /// Tallies `tasks` by status.
    #[must_use]
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut counts, task| {
            *counts.slot(task.status()) += 1;
            counts
        })
    }

    /// Returns the count for `status`.
    #[must_use]
    pub const fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Review => self.review,
            TaskStatus::Completed => self.completed,
            TaskStatus::Cancelled => self.cancelled,
        }
    }

    const fn slot(&mut self, status: TaskStatus) -> &mut usize {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Review => &mut self.review,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Cancelled => &mut self.cancelled,
        }
    }
}

/// User counts per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCounts {
    /// Administrators.
    pub admins: usize,
    /// Managers.
    pub managers: usize,
    /// Members.
    pub members: usize,
}

impl RoleCounts {
    /// Tallies `users` by role.
    #[must_use]
    pub fn tally<'a>(users: impl IntoIterator<Item = &'a UserSummary>) -> Self {
        users.into_iter().fold(Self::default(), |mut counts, user| {
            match user.role() {
                Role::Admin => counts.admins += 1,
                Role::Manager => counts.managers += 1,
                Role::Member => counts.members += 1,
            }
            counts
        })
    }
}

/// Entry of a recent-activity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTask {
    /// Task identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Status.
    pub status: TaskStatus,
    /// Priority.
    pub priority: TaskPriority,
    /// Assignee.
    pub assigned_to: UserId,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for RecentTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_owned(),
            status: task.status(),
            priority: task.priority(),
            assigned_to: task.assigned_to(),
            updated_at: task.updated_at(),
        }
    }
}

/// System-wide figures for administrators. Personal tasks are private and
/// not counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    /// Known users.
    pub total_users: usize,
    /// Active users.
    pub active_users: usize,
    /// Users per role.
    pub users_by_role: RoleCounts,
    /// Live project tasks.
    pub total_tasks: usize,
    /// Live project tasks per status.
    pub tasks_by_status: StatusCounts,
    /// Most recently updated project tasks.
    pub recent_tasks: Vec<RecentTask>,
    /// Computation time.
    pub last_updated: DateTime<Utc>,
}

/// Figures for the project tasks one manager created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerDashboard {
    /// Manager the snapshot is scoped to.
    pub manager_id: UserId,
    /// Live tasks created by the manager.
    pub total_tasks: usize,
    /// Tasks per status.
    pub tasks_by_status: StatusCounts,
    /// High-priority tasks.
    pub high_priority: usize,
    /// Tasks with a due date.
    pub with_due_date: usize,
    /// Open tasks past their due date.
    pub overdue: usize,
    /// Completed share of all tasks, in whole percent.
    pub completion_percent: usize,
    /// Active members on the manager's team.
    pub team_members: usize,
    /// Most recently updated tasks.
    pub recent_tasks: Vec<RecentTask>,
    /// Computation time.
    pub last_updated: DateTime<Utc>,
}

/// Figures for the tasks assigned to one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDashboard {
    /// Member the snapshot is scoped to.
    pub member_id: UserId,
    /// Live tasks assigned to the member.
    pub total_tasks: usize,
    /// Tasks per status.
    pub tasks_by_status: StatusCounts,
    /// Personal tasks.
    pub personal_tasks: usize,
    /// Project tasks.
    pub project_tasks: usize,
    /// Open tasks past their due date.
    pub overdue: usize,
    /// Open tasks due within the configured window.
    pub due_soon: usize,
    /// Most recently updated tasks.
    pub recent_tasks: Vec<RecentTask>,
    /// Computation time.
    pub last_updated: DateTime<Utc>,
}

/// Role-specific dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DashboardSnapshot {
    /// Administrator view.
    Admin(AdminDashboard),
    /// Manager view.
    Manager(ManagerDashboard),
    /// Member view.
    Member(MemberDashboard),
}

impl DashboardSnapshot {
    /// Returns when the snapshot was computed.
    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        match self {
            Self::Admin(snapshot) => snapshot.last_updated,
            Self::Manager(snapshot) => snapshot.last_updated,
            Self::Member(snapshot) => snapshot.last_updated,
        }
    }

    /// Returns the live task total shown on the snapshot.
    #[must_use]
    pub const fn total_tasks(&self) -> usize {
        match self {
            Self::Admin(snapshot) => snapshot.total_tasks,
            Self::Manager(snapshot) => snapshot.total_tasks,
            Self::Member(snapshot) => snapshot.total_tasks,
        }
    }
}
