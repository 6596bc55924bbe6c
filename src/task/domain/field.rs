//! Editable task fields and the values recorded when they change.

use super::{TaskPriority, TaskStatus};
use crate::identity::domain::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A task field that an update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskField {
    /// Task title.
    Title,
    /// Free-form description.
    Description,
    /// Lifecycle status.
    Status,
    /// Priority level.
    Priority,
    /// Due date.
    DueDate,
    /// Assigned member.
    Assignee,
}

impl TaskField {
    /// Every field, in bit order.
    pub const ALL: [Self; 6] = [
        Self::Title,
        Self::Description,
        Self::Status,
        Self::Priority,
        Self::DueDate,
        Self::Assignee,
    ];

    const fn bit(self) -> u8 {
        match self {
            Self::Title => 1,
            Self::Description => 1 << 1,
            Self::Status => 1 << 2,
            Self::Priority => 1 << 3,
            Self::DueDate => 1 << 4,
            Self::Assignee => 1 << 5,
        }
    }

    /// Returns whether changes to this field are kept in the task history.
    #[must_use]
    pub const fn is_tracked(self) -> bool {
        matches!(
            self,
            Self::Status | Self::Priority | Self::DueDate | Self::Assignee
        )
    }

    /// Returns the wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::DueDate => "dueDate",
            Self::Assignee => "assignedTo",
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact set of [`TaskField`]s, usable in `const` permission tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldSet(u8);

impl FieldSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Every field.
    pub const ALL: Self = Self::EMPTY
        .with(TaskField::Title)
        .with(TaskField::Description)
        .with(TaskField::Status)
        .with(TaskField::Priority)
        .with(TaskField::DueDate)
        .with(TaskField::Assignee);

    /// Returns a copy of the set including `field`.
    #[must_use]
    pub const fn with(self, field: TaskField) -> Self {
        Self(self.0 | field.bit())
    }

    /// Returns a copy of the set without `field`.
    #[must_use]
    pub const fn without(self, field: TaskField) -> Self {
        Self(self.0 & !field.bit())
    }

    /// Returns the union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the fields of `self` that are not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns whether `field` is in the set.
    #[must_use]
    pub const fn contains(self, field: TaskField) -> bool {
        self.0 & field.bit() != 0
    }

    /// Returns whether every field of `self` is in `other`.
    #[must_use]
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the fields in the set.
    pub fn iter(self) -> impl Iterator<Item = TaskField> {
        TaskField::ALL
            .into_iter()
            .filter(move |field| self.contains(*field))
    }
}

impl FromIterator<TaskField> for FieldSet {
    fn from_iter<I: IntoIterator<Item = TaskField>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Value of a field before or after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Title or description text.
    Text(Option<String>),
    /// Status value.
    Status(TaskStatus),
    /// Priority value.
    Priority(TaskPriority),
    /// Due date value.
    DueDate(Option<DateTime<Utc>>),
    /// Assignee value.
    Assignee(UserId),
}
