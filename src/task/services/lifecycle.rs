//! Service layer for task creation, mutation and retrieval.
//!
//! Every entry point evaluates the permission table before touching the
//! aggregate. Events, mutation notices and dashboard refreshes are emitted
//! only after the repository write returns; failures on that side are logged
//! and never change the outcome of the mutation.

use crate::config::TaskhubConfig;
use crate::dashboard::domain::DashboardSnapshot;
use crate::dashboard::services::{DashboardAggregator, DashboardError};
use crate::identity::{
    domain::{Actor, Role, UserId},
    ports::{UserDirectory, UserDirectoryError},
};
use crate::realtime::domain::{DashboardAudience, DomainEvent, EventKind};
use crate::realtime::services::HubHandle;
use crate::task::{
    domain::{
        CounterDeltas, DenialReason, FieldChange, FieldValue, PermissionDecision,
        PermissionSubject, Task, TaskChangeSet, TaskDomainError, TaskDraft, TaskField, TaskId,
        TaskKind, TaskOperation, TaskPatch, TaskPriority, TaskStatus, evaluate,
    },
    ports::{
        MutationAction, MutationNotice, MutationSink, TaskQuery, TaskRepository,
        TaskRepositoryError,
    },
};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateTaskRequest {
    /// A private task assigned to its creator.
    Personal(TaskDraft),
    /// A task a manager assigns to a member.
    Project {
        /// Title, description, priority and due date.
        draft: TaskDraft,
        /// Member the task is assigned to.
        assignee: UserId,
    },
}

impl CreateTaskRequest {
    /// Creates a personal task request.
    #[must_use]
    pub const fn personal(draft: TaskDraft) -> Self {
        Self::Personal(draft)
    }

    /// Creates a project task request.
    #[must_use]
    pub const fn project(draft: TaskDraft, assignee: UserId) -> Self {
        Self::Project { draft, assignee }
    }

    /// Returns the kind of task requested.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::Personal(_) => TaskKind::Personal,
            Self::Project { .. } => TaskKind::Project,
        }
    }
}

/// Listing filter. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    kind: Option<TaskKind>,
    search: Option<String>,
}

impl TaskFilter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to one priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restricts to personal or project tasks.
    #[must_use]
    pub const fn with_kind(mut self, kind: TaskKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Case-insensitive search on title and description.
    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    fn apply_to(&self, mut query: TaskQuery) -> TaskQuery {
        query.status = self.status.or(query.status);
        query.priority = self.priority.or(query.priority);
        query.kind = self.kind.or(query.kind);
        query.search.clone_from(&self.search);
        query
    }
}

/// One-based page request. A missing limit uses the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: usize,
    /// Requested page size.
    pub limit: Option<usize>,
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(page: usize, limit: Option<usize>) -> Self {
        Self { page, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, None)
    }
}

/// Pagination block of a listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page, starting at 1.
    pub page: usize,
    /// Effective page size.
    pub limit: usize,
    /// Matching tasks across all pages.
    pub total: usize,
    /// Number of pages.
    pub total_pages: usize,
}

/// One page of tasks, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPage {
    /// Tasks on this page.
    pub items: Vec<Task>,
    /// Page position.
    pub pagination: Pagination,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// The permission table refused the operation. The reason is kept for
    /// logs only.
    #[error("forbidden")]
    Forbidden(DenialReason),
    /// The assignee is unknown, inactive or not a member.
    #[error("user {0} cannot be assigned tasks")]
    InvalidAssignment(UserId),
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The task does not exist or has been deleted.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// Task store failure.
    #[error(transparent)]
    Storage(#[from] TaskRepositoryError),
    /// User directory failure.
    #[error(transparent)]
    Directory(#[from] UserDirectoryError),
    /// Dashboard computation failure.
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Coarse classification of service errors for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Permission denied.
    Forbidden,
    /// Invalid assignee.
    InvalidAssignment,
    /// Status change outside the transition table.
    InvalidTransition,
    /// Malformed input.
    Validation,
    /// Missing task.
    NotFound,
    /// Store or collaborator failure.
    Internal,
}

impl TaskLifecycleError {
    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidAssignment(_) => ErrorKind::InvalidAssignment,
            Self::Domain(TaskDomainError::InvalidTransition { .. }) => ErrorKind::InvalidTransition,
            Self::Domain(TaskDomainError::Deleted(_)) | Self::NotFound(_) => ErrorKind::NotFound,
            Self::Domain(_) | Self::Dashboard(DashboardError::InvalidScope(_)) => {
                ErrorKind::Validation
            }
            Self::Storage(TaskRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Storage(_) | Self::Directory(_) | Self::Dashboard(_) => ErrorKind::Internal,
        }
    }

    /// Builds the client-facing error body.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        let kind = self.kind();
        let message = match kind {
            ErrorKind::Internal => "internal error".to_owned(),
            _ => self.to_string(),
        };
        let transition = match self {
            Self::Domain(TaskDomainError::InvalidTransition {
                current,
                valid_next,
                ..
            }) => Some(TransitionDetails {
                current: *current,
                valid_next: valid_next.clone(),
            }),
            _ => None,
        };
        ErrorResponse {
            kind,
            message,
            transition,
        }
    }
}

/// Serializable error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error classification.
    pub kind: ErrorKind,
    /// Human-readable message. Internal failures are not described.
    pub message: String,
    /// Present for rejected status transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionDetails>,
}

/// Current status and reachable statuses of a rejected transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDetails {
    /// Status the task is in.
    pub current: TaskStatus,
    /// Statuses reachable from `current`.
    pub valid_next: Vec<TaskStatus>,
}

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<R, U, C>
where
    R: TaskRepository,
    U: UserDirectory,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<U>,
    clock: Arc<C>,
    hub: HubHandle,
    sinks: Vec<Arc<dyn MutationSink>>,
    dashboards: DashboardAggregator<R, U, C>,
    config: TaskhubConfig,
}

impl<R, U, C> TaskLifecycleService<R, U, C>
where
    R: TaskRepository,
    U: UserDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a service publishing events through `hub`.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<U>, clock: Arc<C>, hub: HubHandle) -> Self {
        let dashboards = DashboardAggregator::new(
            Arc::clone(&repository),
            Arc::clone(&directory),
            Arc::clone(&clock),
        );
        Self {
            repository,
            directory,
            clock,
            hub,
            sinks: Vec::new(),
            dashboards,
            config: TaskhubConfig::default(),
        }
    }

    /// Applies paging limits and dashboard settings from `config`.
    #[must_use]
    pub fn with_config(mut self, config: TaskhubConfig) -> Self {
        self.dashboards = self.dashboards.with_config(&config);
        self.config = config;
        self
    }

    /// Adds a collaborator notified after every mutation.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MutationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Creates a task.
    ///
    /// Members create personal tasks assigned to themselves; managers create
    /// project tasks for an active member.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] when the actor's role may
    /// not create this kind of task, [`TaskLifecycleError::InvalidAssignment`]
    /// when the assignee is not an active member, and domain or store
    /// errors otherwise.
    pub async fn create_task(
        &self,
        actor: &Actor,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        authorize(actor, TaskOperation::Create(request.kind()), None)?;
        let task = match request {
            CreateTaskRequest::Personal(draft) => {
                Task::new_personal(draft, actor.id, self.clock.as_ref())?
            }
            CreateTaskRequest::Project { draft, assignee } => {
                self.ensure_assignable(assignee).await?;
                Task::new_project(draft, actor.id, assignee, self.clock.as_ref())?
            }
        };
        self.repository.store(&task).await?;
        info!(task_id = %task.id(), kind = ?task.kind(), actor = %actor.id, "task created");

        self.publish_task_event(
            EventKind::TaskCreated,
            &task,
            actor,
            Vec::new(),
            task.creation_deltas(),
        );
        self.notify_sinks(MutationAction::Created, &task, actor);
        self.refresh_dashboards(&task, actor, None).await;
        Ok(task)
    }

    /// Applies a patch to a task.
    ///
    /// The patch is all-or-nothing: if any requested field is outside what
    /// the actor may edit, nothing changes. A patch that changes nothing
    /// returns the task without persisting or publishing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for missing or deleted
    /// tasks, [`TaskLifecycleError::Forbidden`] when permission is denied,
    /// [`TaskLifecycleError::InvalidAssignment`] for a bad assignee, and
    /// [`TaskLifecycleError::Domain`] for invalid titles or transitions.
    pub async fn update_task(
        &self,
        actor: &Actor,
        task_id: TaskId,
        patch: TaskPatch,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.load_live(task_id).await?;
        authorize(
            actor,
            TaskOperation::Update(patch.fields()),
            Some(&PermissionSubject::from(&task)),
        )?;
        if let Some(assignee) = patch.assigned_to
            && assignee != task.assigned_to()
            && !task.is_personal()
        {
            self.ensure_assignable(assignee).await?;
        }

        let changes = task.apply(&patch, actor.id, self.clock.as_ref())?;
        if changes.is_empty() {
            debug!(%task_id, "patch left task unchanged");
            return Ok(task);
        }
        self.repository.update(&task).await?;
        info!(
            %task_id,
            actor = %actor.id,
            changes = changes.changes().len(),
            "task updated"
        );

        for (kind, grouped) in events_for(&changes) {
            let mut counters = CounterDeltas::new();
            for change in &grouped {
                counters.extend(change.counters.clone());
            }
            self.publish_task_event(kind, &task, actor, grouped, counters);
        }
        self.notify_sinks(mutation_action(&changes), &task, actor);
        self.refresh_dashboards(&task, actor, previous_assignee(&changes))
            .await;
        Ok(task)
    }

    /// Soft-deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for missing or deleted
    /// tasks, [`TaskLifecycleError::Forbidden`] unless the actor created the
    /// task, and store errors otherwise.
    pub async fn delete_task(&self, actor: &Actor, task_id: TaskId) -> TaskLifecycleResult<()> {
        let mut task = self.load_live(task_id).await?;
        authorize(
            actor,
            TaskOperation::Delete,
            Some(&PermissionSubject::from(&task)),
        )?;
        let deltas = task.mark_deleted(self.clock.as_ref())?;
        self.repository.update(&task).await?;
        info!(%task_id, actor = %actor.id, "task deleted");

        self.publish_task_event(EventKind::TaskDeleted, &task, actor, Vec::new(), deltas);
        self.notify_sinks(MutationAction::Deleted, &task, actor);
        self.refresh_dashboards(&task, actor, None).await;
        Ok(())
    }

    /// Returns a task the actor may read.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for missing or deleted
    /// tasks and [`TaskLifecycleError::Forbidden`] when the actor may not
    /// read it.
    pub async fn get_task(&self, actor: &Actor, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let task = self.load_live(task_id).await?;
        authorize(
            actor,
            TaskOperation::Read,
            Some(&PermissionSubject::from(&task)),
        )?;
        Ok(task)
    }

    /// Lists the tasks the actor may read, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for inactive actors and
    /// store errors otherwise.
    pub async fn list_tasks(
        &self,
        actor: &Actor,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> TaskLifecycleResult<TaskPage> {
        if !actor.active {
            return Err(TaskLifecycleError::Forbidden(DenialReason::InactiveActor));
        }
        let query = filter.apply_to(visibility(actor));
        let total = self.repository.count(&query).await?;
        let limit = self.config.page_size(page.limit);
        let page_number = page.page.max(1);
        let items = self
            .repository
            .find(&query)
            .await?
            .into_iter()
            .filter(|task| {
                evaluate(actor, TaskOperation::Read, Some(&PermissionSubject::from(task)))
                    .is_allowed()
            })
            .skip((page_number - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Ok(TaskPage {
            items,
            pagination: Pagination {
                page: page_number,
                limit,
                total,
                total_pages: total.div_ceil(limit),
            },
        })
    }

    /// Computes the actor's own dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for inactive actors and
    /// dashboard errors otherwise.
    pub async fn get_dashboard(&self, actor: &Actor) -> TaskLifecycleResult<DashboardSnapshot> {
        if !actor.active {
            return Err(TaskLifecycleError::Forbidden(DenialReason::InactiveActor));
        }
        Ok(self.dashboards.snapshot(actor.role, Some(actor.id)).await?)
    }

    async fn load_live(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .filter(|task| !task.is_deleted())
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    async fn ensure_assignable(&self, assignee: UserId) -> TaskLifecycleResult<()> {
        let assignable = self
            .directory
            .find_by_id(assignee)
            .await?
            .is_some_and(|user| user.is_active() && user.role() == Role::Member);
        if assignable {
            Ok(())
        } else {
            Err(TaskLifecycleError::InvalidAssignment(assignee))
        }
    }

    fn publish_task_event(
        &self,
        kind: EventKind,
        task: &Task,
        actor: &Actor,
        changes: Vec<FieldChange>,
        counters: CounterDeltas,
    ) {
        if let Some(event) =
            DomainEvent::for_task(kind, task, actor, changes, counters, task.updated_at())
        {
            self.hub.publish(event);
        }
    }

    fn notify_sinks(&self, action: MutationAction, task: &Task, actor: &Actor) {
        if self.sinks.is_empty() {
            return;
        }
        let notice = Arc::new(MutationNotice {
            action,
            task: task.clone(),
            actor: actor.clone(),
        });
        for registered in &self.sinks {
            let sink = Arc::clone(registered);
            let delivered = Arc::clone(&notice);
            tokio::spawn(async move {
                if let Err(err) = sink.notify(&delivered).await {
                    warn!(
                        task_id = %delivered.task.id(),
                        action = ?delivered.action,
                        error = %err,
                        "mutation sink failed"
                    );
                }
            });
        }
    }

    /// Pushes fresh snapshots to every dashboard a project task counts
    /// towards: the administrators, the creating manager, the assignee and,
    /// after a reassignment, the member who lost the task.
    async fn refresh_dashboards(
        &self,
        task: &Task,
        actor: &Actor,
        previous_assignee: Option<UserId>,
    ) {
        if !self.config.refresh_dashboards_on_mutation || task.is_personal() {
            return;
        }
        let mut targets = vec![
            (Role::Admin, None, DashboardAudience::Admins),
            (
                Role::Manager,
                Some(task.created_by()),
                DashboardAudience::Manager(task.created_by()),
            ),
            (
                Role::Member,
                Some(task.assigned_to()),
                DashboardAudience::Member(task.assigned_to()),
            ),
        ];
        if let Some(old) = previous_assignee.filter(|old| *old != task.assigned_to()) {
            targets.push((Role::Member, Some(old), DashboardAudience::Member(old)));
        }
        for (role, scope, audience) in targets {
            match self.dashboards.snapshot(role, scope).await {
                Ok(snapshot) => self
                    .hub
                    .publish(DomainEvent::for_dashboard(snapshot, audience, actor)),
                Err(err) => warn!(%role, ?scope, error = %err, "dashboard refresh failed"),
            }
        }
    }
}

fn authorize(
    actor: &Actor,
    operation: TaskOperation,
    subject: Option<&PermissionSubject>,
) -> TaskLifecycleResult<()> {
    match evaluate(actor, operation, subject) {
        PermissionDecision::Allow { .. } => Ok(()),
        PermissionDecision::Deny(reason) => {
            info!(actor = %actor.id, ?operation, ?reason, "operation denied");
            Err(TaskLifecycleError::Forbidden(reason))
        }
    }
}

/// Narrows the store query to the tasks a role can read, so the store's
/// count is the listing total.
fn visibility(actor: &Actor) -> TaskQuery {
    match actor.role {
        Role::Admin => TaskQuery::new().kind(TaskKind::Project),
        Role::Manager => TaskQuery::new().created_by(actor.id),
        Role::Member => TaskQuery::new().assigned_to(actor.id),
    }
}

/// Groups applied changes into task events. Title and description changes
/// share one `TASK_UPDATED` event; every tracked field gets its own event
/// carrying the counter deltas it caused.
fn events_for(changes: &TaskChangeSet) -> Vec<(EventKind, Vec<FieldChange>)> {
    let mut events = Vec::new();
    let content: Vec<FieldChange> = changes
        .changes()
        .iter()
        .filter(|change| !change.field.is_tracked())
        .cloned()
        .collect();
    if !content.is_empty() {
        events.push((EventKind::TaskUpdated, content));
    }
    for change in changes.changes().iter().filter(|change| change.field.is_tracked()) {
        let kind = match change.field {
            TaskField::Status if completes(change) => EventKind::TaskCompleted,
            TaskField::Status => EventKind::TaskStatusChanged,
            TaskField::Priority => EventKind::TaskPriorityChanged,
            TaskField::DueDate => EventKind::TaskDueDateChanged,
            TaskField::Assignee => EventKind::TaskAssigned,
            TaskField::Title | TaskField::Description => EventKind::TaskUpdated,
        };
        events.push((kind, vec![change.clone()]));
    }
    events
}

fn previous_assignee(changes: &TaskChangeSet) -> Option<UserId> {
    match changes.change(TaskField::Assignee)?.old_value {
        FieldValue::Assignee(old) => Some(old),
        _ => None,
    }
}

fn mutation_action(changes: &TaskChangeSet) -> MutationAction {
    if changes.change(TaskField::Status).is_some_and(completes) {
        MutationAction::Completed
    } else if changes.change(TaskField::Assignee).is_some() {
        MutationAction::Assigned
    } else {
        MutationAction::Updated
    }
}

fn completes(change: &FieldChange) -> bool {
    change.new_value == FieldValue::Status(TaskStatus::Completed)
}
