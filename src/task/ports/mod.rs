//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod repository;
pub mod sink;

pub use repository::{TaskQuery, TaskRepository, TaskRepositoryError, TaskRepositoryResult};
pub use sink::{MutationAction, MutationNotice, MutationSink, SinkError};

#[cfg(test)]
pub use repository::MockTaskRepository;
#[cfg(test)]
pub use sink::MockMutationSink;
