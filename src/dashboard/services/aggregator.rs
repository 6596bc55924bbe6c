//! Recomputes role-scoped dashboard snapshots from the stores.

use crate::config::TaskhubConfig;
use crate::dashboard::domain::{
    AdminDashboard, DashboardSnapshot, ManagerDashboard, MemberDashboard, RecentTask, RoleCounts,
    StatusCounts,
};
use crate::dashboard::ports::{DashboardError, DashboardResult, SnapshotProvider};
use crate::identity::{
    domain::{Role, UserId},
    ports::UserDirectory,
};
use crate::task::{
    domain::{Task, TaskKind, TaskPriority, TaskStatus},
    ports::{TaskQuery, TaskRepository},
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::sync::Arc;

/// Computes dashboard snapshots on demand. Cost is linear in the number of
/// matching records; nothing is cached.
#[derive(Clone)]
pub struct DashboardAggregator<R, U, C>
where
    R: TaskRepository,
    U: UserDirectory,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    users: Arc<U>,
    clock: Arc<C>,
    recent_limit: usize,
    due_soon_window: TimeDelta,
}

impl<R, U, C> DashboardAggregator<R, U, C>
where
    R: TaskRepository,
    U: UserDirectory,
    C: Clock + Send + Sync,
{
    /// Creates an aggregator using default configuration.
    #[must_use]
    pub fn new(tasks: Arc<R>, users: Arc<U>, clock: Arc<C>) -> Self {
        let config = TaskhubConfig::default();
        Self {
            tasks,
            users,
            clock,
            recent_limit: config.recent_activity_limit,
            due_soon_window: config.due_soon_window(),
        }
    }

    /// Applies list sizes and windows from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &TaskhubConfig) -> Self {
        self.recent_limit = config.recent_activity_limit;
        self.due_soon_window = config.due_soon_window();
        self
    }

    /// Computes the snapshot for `role`, scoped to `scope` for managers and
    /// members.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidScope`] when a manager or member
    /// snapshot is requested without a scope, or store errors.
    pub async fn snapshot(
        &self,
        role: Role,
        scope: Option<UserId>,
    ) -> DashboardResult<DashboardSnapshot> {
        match (role, scope) {
            (Role::Admin, _) => self.admin().await,
            (Role::Manager, Some(manager)) => self.manager(manager).await,
            (Role::Member, Some(member)) => self.member(member).await,
            (Role::Manager | Role::Member, None) => Err(DashboardError::InvalidScope(role)),
        }
    }

    async fn admin(&self) -> DashboardResult<DashboardSnapshot> {
        let users = self.users.list().await?;
        let tasks = self
            .tasks
            .find(&TaskQuery::new().kind(TaskKind::Project))
            .await?;
        Ok(DashboardSnapshot::Admin(AdminDashboard {
            total_users: users.len(),
            active_users: users.iter().filter(|user| user.is_active()).count(),
            users_by_role: RoleCounts::tally(&users),
            total_tasks: tasks.len(),
            tasks_by_status: StatusCounts::tally(&tasks),
            recent_tasks: self.recent(&tasks),
            last_updated: self.clock.utc(),
        }))
    }

    async fn manager(&self, manager: UserId) -> DashboardResult<DashboardSnapshot> {
        let now = self.clock.utc();
        let tasks = self
            .tasks
            .find(
                &TaskQuery::new()
                    .created_by(manager)
                    .kind(TaskKind::Project),
            )
            .await?;
        let team_members = self.team_members(manager).await?;
        let by_status = StatusCounts::tally(&tasks);
        Ok(DashboardSnapshot::Manager(ManagerDashboard {
            manager_id: manager,
            total_tasks: tasks.len(),
            tasks_by_status: by_status,
            high_priority: tasks
                .iter()
                .filter(|task| task.priority() == TaskPriority::High)
                .count(),
            with_due_date: tasks.iter().filter(|task| task.due_date().is_some()).count(),
            overdue: tasks.iter().filter(|task| task.is_overdue(now)).count(),
            completion_percent: percent(by_status.get(TaskStatus::Completed), tasks.len()),
            team_members,
            recent_tasks: self.recent(&tasks),
            last_updated: now,
        }))
    }

    async fn member(&self, member: UserId) -> DashboardResult<DashboardSnapshot> {
        let now = self.clock.utc();
        let tasks = self
            .tasks
            .find(&TaskQuery::new().assigned_to(member))
            .await?;
        let personal_tasks = tasks.iter().filter(|task| task.is_personal()).count();
        Ok(DashboardSnapshot::Member(MemberDashboard {
            member_id: member,
            total_tasks: tasks.len(),
            tasks_by_status: StatusCounts::tally(&tasks),
            personal_tasks,
            project_tasks: tasks.len().saturating_sub(personal_tasks),
            overdue: tasks.iter().filter(|task| task.is_overdue(now)).count(),
            due_soon: tasks
                .iter()
                .filter(|task| is_due_soon(task, now, self.due_soon_window))
                .count(),
            recent_tasks: self.recent(&tasks),
            last_updated: now,
        }))
    }

    async fn team_members(&self, manager: UserId) -> DashboardResult<usize> {
        let Some(team) = self
            .users
            .find_by_id(manager)
            .await?
            .and_then(|summary| summary.team_id())
        else {
            return Ok(0);
        };
        let users = self.users.list().await?;
        Ok(users
            .iter()
            .filter(|user| {
                user.role() == Role::Member && user.is_active() && user.team_id() == Some(team)
            })
            .count())
    }

    fn recent(&self, tasks: &[Task]) -> Vec<RecentTask> {
        let mut recent: Vec<&Task> = tasks.iter().collect();
        recent.sort_by_key(|task| std::cmp::Reverse(task.updated_at()));
        recent
            .into_iter()
            .take(self.recent_limit)
            .map(RecentTask::from)
            .collect()
    }
}

#[async_trait]
impl<R, U, C> SnapshotProvider for DashboardAggregator<R, U, C>
where
    R: TaskRepository,
    U: UserDirectory,
    C: Clock + Send + Sync,
{
    async fn snapshot(
        &self,
        role: Role,
        scope: Option<UserId>,
    ) -> DashboardResult<DashboardSnapshot> {
        Self::snapshot(self, role, scope).await
    }
}

fn is_due_soon(task: &Task, now: DateTime<Utc>, window: TimeDelta) -> bool {
    task.is_open()
        && task
            .due_date()
            .is_some_and(|due| due >= now && due - now <= window)
}

fn percent(part: usize, whole: usize) -> usize {
    part.saturating_mul(100).checked_div(whole).unwrap_or(0)
}
