//! Declarative counter deltas derived from task changes.
//!
//! Each task contributes to a small set of aggregate counters depending on
//! its status, priority and due date. A change is expressed as the
//! difference between the contributions before and after, so every call site
//! gets the same increment/decrement logic.

use super::{TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate counter affected by task changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterKind {
    /// Live (non-deleted) tasks.
    TaskCreated,
    /// Tasks in `COMPLETED`.
    TaskCompleted,
    /// Tasks in `IN_PROGRESS`.
    TaskInProgress,
    /// Tasks with `HIGH` priority.
    TaskHighPriority,
    /// Tasks with a due date.
    TaskHasDueDate,
}

impl CounterKind {
    /// Returns the wire name of the counter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "TASK_CREATED",
            Self::TaskCompleted => "TASK_COMPLETED",
            Self::TaskInProgress => "TASK_IN_PROGRESS",
            Self::TaskHighPriority => "TASK_HIGH_PRIORITY",
            Self::TaskHasDueDate => "TASK_HAS_DUE_DATE",
        }
    }

    fn for_status(status: TaskStatus) -> Option<Self> {
        match status {
            TaskStatus::Completed => Some(Self::TaskCompleted),
            TaskStatus::InProgress => Some(Self::TaskInProgress),
            TaskStatus::Todo | TaskStatus::Review | TaskStatus::Cancelled => None,
        }
    }

    fn for_priority(priority: TaskPriority) -> Option<Self> {
        (priority == TaskPriority::High).then_some(Self::TaskHighPriority)
    }

    fn for_due_date(due_date: Option<DateTime<Utc>>) -> Option<Self> {
        due_date.map(|_| Self::TaskHasDueDate)
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed single-step change to one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDelta {
    /// Affected counter.
    pub counter: CounterKind,
    /// `+1` or `-1`.
    pub delta: i8,
}

impl CounterDelta {
    /// Increment of `counter`.
    #[must_use]
    pub const fn increment(counter: CounterKind) -> Self {
        Self { counter, delta: 1 }
    }

    /// Decrement of `counter`.
    #[must_use]
    pub const fn decrement(counter: CounterKind) -> Self {
        Self { counter, delta: -1 }
    }
}

impl fmt::Display for CounterDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:+}", self.counter, self.delta)
    }
}

/// Ordered collection of counter deltas produced by one logical update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterDeltas(Vec<CounterDelta>);

impl CounterDeltas {
    /// Creates an empty delta set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Deltas for a freshly created task.
    #[must_use]
    pub fn for_creation(
        status: TaskStatus,
        priority: TaskPriority,
        due_date: Option<DateTime<Utc>>,
    ) -> Self {
        let mut deltas = Self(vec![CounterDelta::increment(CounterKind::TaskCreated)]);
        deltas.push_diff(None, CounterKind::for_status(status));
        deltas.push_diff(None, CounterKind::for_priority(priority));
        deltas.push_diff(None, CounterKind::for_due_date(due_date));
        deltas
    }

    /// Deltas for removing a task from the live counts.
    #[must_use]
    pub fn for_deletion(
        status: TaskStatus,
        priority: TaskPriority,
        due_date: Option<DateTime<Utc>>,
    ) -> Self {
        let mut deltas = Self(vec![CounterDelta::decrement(CounterKind::TaskCreated)]);
        deltas.push_diff(CounterKind::for_status(status), None);
        deltas.push_diff(CounterKind::for_priority(priority), None);
        deltas.push_diff(CounterKind::for_due_date(due_date), None);
        deltas
    }

    /// Deltas for a status transition.
    #[must_use]
    pub fn for_status_change(from: TaskStatus, to: TaskStatus) -> Self {
        let mut deltas = Self::new();
        deltas.push_diff(CounterKind::for_status(from), CounterKind::for_status(to));
        deltas
    }

    /// Deltas for a priority change.
    #[must_use]
    pub fn for_priority_change(from: TaskPriority, to: TaskPriority) -> Self {
        let mut deltas = Self::new();
        deltas.push_diff(CounterKind::for_priority(from), CounterKind::for_priority(to));
        deltas
    }

    /// Deltas for a due-date change.
    #[must_use]
    pub fn for_due_date_change(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        let mut deltas = Self::new();
        deltas.push_diff(CounterKind::for_due_date(from), CounterKind::for_due_date(to));
        deltas
    }

    fn push_diff(&mut self, before: Option<CounterKind>, after: Option<CounterKind>) {
        if before == after {
            return;
        }
        if let Some(counter) = before {
            self.0.push(CounterDelta::decrement(counter));
        }
        if let Some(counter) = after {
            self.0.push(CounterDelta::increment(counter));
        }
    }

    /// Appends every delta of `other`.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Returns the summed change for `counter`.
    #[must_use]
    pub fn net(&self, counter: CounterKind) -> i32 {
        self.0
            .iter()
            .filter(|delta| delta.counter == counter)
            .map(|delta| i32::from(delta.delta))
            .sum()
    }

    /// Returns whether no counter changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the deltas in emission order.
    #[must_use]
    pub fn as_slice(&self) -> &[CounterDelta] {
        &self.0
    }

    /// Iterates the deltas in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &CounterDelta> {
        self.0.iter()
    }
}
