//! Read-only directory of identity summaries.

use crate::identity::domain::{UserId, UserSummary};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory lookups.
pub type UserDirectoryResult<T> = Result<T, UserDirectoryError>;

/// Identity lookup contract backed by the user-management collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds an identity by identifier.
    ///
    /// Returns `None` when the identity does not exist.
    async fn find_by_id(&self, id: UserId) -> UserDirectoryResult<Option<UserSummary>>;

    /// Returns every known identity.
    async fn list(&self) -> UserDirectoryResult<Vec<UserSummary>>;
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum UserDirectoryError {
    /// Persistence-layer failure.
    #[error("directory error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl UserDirectoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
