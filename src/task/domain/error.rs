//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The requested status is not reachable from the current status.
    #[error("task {task_id} cannot move from {current} to {requested}")]
    InvalidTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Status the task is currently in.
        current: TaskStatus,
        /// Status that was requested.
        requested: TaskStatus,
        /// Statuses reachable from `current`.
        valid_next: Vec<TaskStatus>,
    },

    /// Personal tasks stay assigned to their creator.
    #[error("personal task {0} cannot be reassigned")]
    PersonalTaskReassignment(TaskId),

    /// The task has already been deleted.
    #[error("task {0} has been deleted")]
    Deleted(TaskId),
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
