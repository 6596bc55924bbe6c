//! Domain model for task lifecycle management.
//!
//! The task domain models personal and project tasks, the status graph they
//! move through, the role-based permission table that gates every operation,
//! and the counter deltas derived from each accepted change. Everything here
//! is free of I/O.

mod counters;
mod error;
mod field;
mod ids;
mod permission;
mod status;
mod task;

pub use counters::{CounterDelta, CounterDeltas, CounterKind};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use field::{FieldSet, FieldValue, TaskField};
pub use ids::TaskId;
pub use permission::{
    DenialReason, PERMISSION_TABLE, PermissionDecision, PermissionRule, PermissionSubject, Relation,
    RelationRule, RuleOperation, TaskOperation, evaluate,
};
pub use status::{TaskPriority, TaskStatus};
pub use task::{FieldChange, Task, TaskChangeSet, TaskDraft, TaskHistoryEntry, TaskKind, TaskPatch};
