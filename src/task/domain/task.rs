//! Task aggregate root and the change records it produces.

use super::{
    CounterDeltas, FieldSet, FieldValue, TaskDomainError, TaskField, TaskId, TaskPriority,
    TaskStatus,
};
use crate::identity::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Distinguishes private tasks from manager-assigned ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// Created by a member for themselves; never broadcast.
    Personal,
    /// Created by a manager and assigned to a member.
    Project,
}

/// Creation input shared by personal and project tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    description: Option<String>,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// Creates a draft with the given title and default priority.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: TaskPriority::default(),
            due_date: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Immutable record of one tracked field change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHistoryEntry {
    /// Changed field.
    pub field: TaskField,
    /// Value before the change.
    pub old_value: FieldValue,
    /// Value after the change.
    pub new_value: FieldValue,
    /// When the change was applied.
    pub changed_at: DateTime<Utc>,
    /// Who applied the change.
    pub changed_by: UserId,
}

/// Partial update of a task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Requested status.
    pub status: Option<TaskStatus>,
    /// New priority.
    pub priority: Option<TaskPriority>,
    /// New due date; `Some(None)` clears it.
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// New assignee.
    pub assigned_to: Option<UserId>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    /// Clears the description.
    #[must_use]
    pub fn clear_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    /// Requests a status transition.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(Some(due_date));
        self
    }

    /// Clears the due date.
    #[must_use]
    pub const fn clear_due_date(mut self) -> Self {
        self.due_date = Some(None);
        self
    }

    /// Reassigns the task.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assigned_to = Some(assignee);
        self
    }

    /// Returns the fields this patch asks to change.
    #[must_use]
    pub fn fields(&self) -> FieldSet {
        let mut fields = FieldSet::EMPTY;
        if self.title.is_some() {
            fields = fields.with(TaskField::Title);
        }
        if self.description.is_some() {
            fields = fields.with(TaskField::Description);
        }
        if self.status.is_some() {
            fields = fields.with(TaskField::Status);
        }
        if self.priority.is_some() {
            fields = fields.with(TaskField::Priority);
        }
        if self.due_date.is_some() {
            fields = fields.with(TaskField::DueDate);
        }
        if self.assigned_to.is_some() {
            fields = fields.with(TaskField::Assignee);
        }
        fields
    }
}

/// One applied field change together with the counters it moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// Changed field.
    pub field: TaskField,
    /// Value before the change.
    pub old_value: FieldValue,
    /// Value after the change.
    pub new_value: FieldValue,
    /// Counter deltas caused by this change.
    pub counters: CounterDeltas,
}

/// Outcome of applying a [`TaskPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChangeSet {
    changes: Vec<FieldChange>,
}

impl TaskChangeSet {
    /// Returns the applied changes in field order.
    #[must_use]
    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// Returns the change for `field`, if it was applied.
    #[must_use]
    pub fn change(&self, field: TaskField) -> Option<&FieldChange> {
        self.changes.iter().find(|change| change.field == field)
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns every counter delta of the update, in field order.
    #[must_use]
    pub fn deltas(&self) -> CounterDeltas {
        let mut deltas = CounterDeltas::new();
        for change in &self.changes {
            deltas.extend(change.counters.clone());
        }
        deltas
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
    is_personal: bool,
    created_by: UserId,
    assigned_by: UserId,
    assigned_to: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    status_changed_at: Option<DateTime<Utc>>,
    priority_changed_at: Option<DateTime<Utc>>,
    assignment_changed_at: Option<DateTime<Utc>>,
    due_date_changed_at: Option<DateTime<Utc>>,
    history: Vec<TaskHistoryEntry>,
}

impl Task {
    /// Creates a personal task owned and assigned to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new_personal(
        draft: TaskDraft,
        owner: UserId,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        Self::create(draft, TaskKind::Personal, owner, owner, clock)
    }

    /// Creates a project task created by `manager` and assigned to `assignee`.
    ///
    /// Verifying that the assignee is an active member is the caller's job;
    /// the aggregate has no access to the directory.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new_project(
        draft: TaskDraft,
        manager: UserId,
        assignee: UserId,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        Self::create(draft, TaskKind::Project, manager, assignee, clock)
    }

    fn create(
        draft: TaskDraft,
        kind: TaskKind,
        creator: UserId,
        assignee: UserId,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let title = normalize_title(&draft.title)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            title,
            description: normalize_description(draft.description),
            status: TaskStatus::Todo,
            priority: draft.priority,
            due_date: draft.due_date,
            is_personal: kind == TaskKind::Personal,
            created_by: creator,
            assigned_by: creator,
            assigned_to: assignee,
            created_at: timestamp,
            updated_at: timestamp,
            completed_at: None,
            deleted_at: None,
            status_changed_at: None,
            priority_changed_at: None,
            assignment_changed_at: None,
            due_date_changed_at: None,
            history: Vec::new(),
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns whether this is a personal task.
    #[must_use]
    pub const fn is_personal(&self) -> bool {
        self.is_personal
    }

    /// Returns the task kind.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        if self.is_personal {
            TaskKind::Personal
        } else {
            TaskKind::Project
        }
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns who made the current assignment.
    #[must_use]
    pub const fn assigned_by(&self) -> UserId {
        self.assigned_by
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn assigned_to(&self) -> UserId {
        self.assigned_to
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns when the task was last completed, while it stays completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the deletion timestamp, if deleted.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns whether the task has been deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the last status change timestamp.
    #[must_use]
    pub const fn status_changed_at(&self) -> Option<DateTime<Utc>> {
        self.status_changed_at
    }

    /// Returns the last priority change timestamp.
    #[must_use]
    pub const fn priority_changed_at(&self) -> Option<DateTime<Utc>> {
        self.priority_changed_at
    }

    /// Returns the last reassignment timestamp.
    #[must_use]
    pub const fn assignment_changed_at(&self) -> Option<DateTime<Utc>> {
        self.assignment_changed_at
    }

    /// Returns the last due-date change timestamp.
    #[must_use]
    pub const fn due_date_changed_at(&self) -> Option<DateTime<Utc>> {
        self.due_date_changed_at
    }

    /// Returns the tracked change history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[TaskHistoryEntry] {
        &self.history
    }

    /// Returns whether the due date has passed on an open task.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_date.is_some_and(|due| due < now)
    }

    /// Returns whether the task is neither completed nor cancelled.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.status, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Returns the counter deltas this task contributed when created.
    #[must_use]
    pub fn creation_deltas(&self) -> CounterDeltas {
        CounterDeltas::for_creation(self.status, self.priority, self.due_date)
    }

    /// Applies a patch atomically.
    ///
    /// Every part of the patch is validated before anything is written, so a
    /// rejected patch leaves the task untouched. Fields set to their current
    /// value are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Deleted`] for deleted tasks,
    /// [`TaskDomainError::EmptyTitle`] for a blank title,
    /// [`TaskDomainError::InvalidTransition`] when the status graph forbids
    /// the move, and [`TaskDomainError::PersonalTaskReassignment`] when a
    /// personal task would change hands.
    pub fn apply(
        &mut self,
        patch: &TaskPatch,
        actor: UserId,
        clock: &impl Clock,
    ) -> Result<TaskChangeSet, TaskDomainError> {
        if self.is_deleted() {
            return Err(TaskDomainError::Deleted(self.id));
        }
        let title = patch.title.as_deref().map(normalize_title).transpose()?;
        if let Some(requested) = patch.status
            && requested != self.status
            && !self.status.can_transition_to(requested)
        {
            return Err(TaskDomainError::InvalidTransition {
                task_id: self.id,
                current: self.status,
                requested,
                valid_next: self.status.valid_next().to_vec(),
            });
        }
        if self.is_personal
            && patch
                .assigned_to
                .is_some_and(|assignee| assignee != self.assigned_to)
        {
            return Err(TaskDomainError::PersonalTaskReassignment(self.id));
        }

        let now = clock.utc();
        let mut changes = Vec::new();

        if let Some(title) = title.filter(|title| *title != self.title) {
            let old = std::mem::replace(&mut self.title, title);
            changes.push(FieldChange {
                field: TaskField::Title,
                old_value: FieldValue::Text(Some(old)),
                new_value: FieldValue::Text(Some(self.title.clone())),
                counters: CounterDeltas::new(),
            });
        }
        if let Some(raw) = patch.description.clone() {
            let description = normalize_description(raw);
            if description != self.description {
                let old = std::mem::replace(&mut self.description, description);
                changes.push(FieldChange {
                    field: TaskField::Description,
                    old_value: FieldValue::Text(old),
                    new_value: FieldValue::Text(self.description.clone()),
                    counters: CounterDeltas::new(),
                });
            }
        }
        if let Some(status) = patch.status.filter(|status| *status != self.status) {
            let old = self.status;
            self.status = status;
            self.status_changed_at = Some(now);
            self.completed_at = (status == TaskStatus::Completed).then_some(now);
            changes.push(FieldChange {
                field: TaskField::Status,
                old_value: FieldValue::Status(old),
                new_value: FieldValue::Status(status),
                counters: CounterDeltas::for_status_change(old, status),
            });
        }
        if let Some(priority) = patch.priority.filter(|priority| *priority != self.priority) {
            let old = self.priority;
            self.priority = priority;
            self.priority_changed_at = Some(now);
            changes.push(FieldChange {
                field: TaskField::Priority,
                old_value: FieldValue::Priority(old),
                new_value: FieldValue::Priority(priority),
                counters: CounterDeltas::for_priority_change(old, priority),
            });
        }
        if let Some(due_date) = patch.due_date.filter(|due_date| *due_date != self.due_date) {
            let old = self.due_date;
            self.due_date = due_date;
            self.due_date_changed_at = Some(now);
            changes.push(FieldChange {
                field: TaskField::DueDate,
                old_value: FieldValue::DueDate(old),
                new_value: FieldValue::DueDate(due_date),
                counters: CounterDeltas::for_due_date_change(old, due_date),
            });
        }
        if let Some(assignee) = patch
            .assigned_to
            .filter(|assignee| *assignee != self.assigned_to)
        {
            let old = self.assigned_to;
            self.assigned_to = assignee;
            self.assigned_by = actor;
            self.assignment_changed_at = Some(now);
            changes.push(FieldChange {
                field: TaskField::Assignee,
                old_value: FieldValue::Assignee(old),
                new_value: FieldValue::Assignee(assignee),
                counters: CounterDeltas::new(),
            });
        }

        if !changes.is_empty() {
            self.updated_at = now;
        }
        self.history.extend(
            changes
                .iter()
                .filter(|change| change.field.is_tracked())
                .map(|change| TaskHistoryEntry {
                    field: change.field,
                    old_value: change.old_value.clone(),
                    new_value: change.new_value.clone(),
                    changed_at: now,
                    changed_by: actor,
                }),
        );
        Ok(TaskChangeSet { changes })
    }

    /// Marks the task deleted, removing it from every live count.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Deleted`] if the task is already deleted.
    pub fn mark_deleted(&mut self, clock: &impl Clock) -> Result<CounterDeltas, TaskDomainError> {
        if self.is_deleted() {
            return Err(TaskDomainError::Deleted(self.id));
        }
        let now = clock.utc();
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(CounterDeltas::for_deletion(
            self.status,
            self.priority,
            self.due_date,
        ))
    }
}

fn normalize_title(title: &str) -> Result<String, TaskDomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
