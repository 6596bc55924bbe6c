//! Fire-and-forget collaborators notified after a successful mutation.
//!
//! Activity logging, e-mail and in-app notifications all hang off this port.
//! Their failures are logged by the caller and never fail the mutation.

use crate::identity::domain::Actor;
use crate::task::domain::Task;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Kind of mutation being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationAction {
    /// A task was created.
    Created,
    /// A task was updated.
    Updated,
    /// A task was assigned to a different member.
    Assigned,
    /// A task was completed.
    Completed,
    /// A task was deleted.
    Deleted,
}

/// Notice handed to each [`MutationSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationNotice {
    /// What happened.
    pub action: MutationAction,
    /// Task state after the mutation.
    pub task: Task,
    /// Who performed the mutation.
    pub actor: Actor,
}

/// Receiver of mutation notices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MutationSink: Send + Sync {
    /// Handles one notice.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the collaborator fails; the caller only
    /// logs it.
    async fn notify(&self, notice: &MutationNotice) -> Result<(), SinkError>;
}

/// Failure reported by a mutation sink.
#[derive(Debug, Clone, Error)]
#[error("mutation sink failed: {0}")]
pub struct SinkError(pub Arc<dyn std::error::Error + Send + Sync>);

impl SinkError {
    /// Wraps a collaborator error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
