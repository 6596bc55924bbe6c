//! Source of recomputed dashboard snapshots.

use crate::dashboard::domain::DashboardSnapshot;
use crate::identity::{
    domain::{Role, UserId},
    ports::UserDirectoryError,
};
use crate::task::ports::TaskRepositoryError;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Computes a role's dashboard on demand.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Computes the snapshot for `role`, scoped to `scope` for managers and
    /// members.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidScope`] when a scoped role has no
    /// scope, or the underlying store error.
    async fn snapshot(
        &self,
        role: Role,
        scope: Option<UserId>,
    ) -> DashboardResult<DashboardSnapshot>;
}

/// Errors returned while computing a snapshot.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Manager and member snapshots need the identity they are scoped to.
    #[error("{0} dashboards require a scope identity")]
    InvalidScope(Role),
    /// Task store failure.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// User directory failure.
    #[error(transparent)]
    Directory(#[from] UserDirectoryError),
}
