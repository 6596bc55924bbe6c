//! In-memory identity adapters for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::identity::{
    domain::{UserId, UserSummary},
    ports::{
        AuthError, CredentialVerifier, UserDirectory, UserDirectoryError, UserDirectoryResult,
        VerifiedIdentity,
    },
};

/// Thread-safe in-memory user directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, UserSummary>>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an identity.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Persistence`] when the lock is poisoned.
    pub fn upsert(&self, user: UserSummary) -> UserDirectoryResult<()> {
        let mut users = self.users.write().map_err(|err| {
            UserDirectoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        users.insert(user.id(), user);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: UserId) -> UserDirectoryResult<Option<UserSummary>> {
        let users = self.users.read().map_err(|err| {
            UserDirectoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(users.get(&id).cloned())
    }

    async fn list(&self) -> UserDirectoryResult<Vec<UserSummary>> {
        let users = self.users.read().map_err(|err| {
            UserDirectoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(users.values().cloned().collect())
    }
}

/// Credential verifier backed by a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialVerifier {
    tokens: Arc<RwLock<HashMap<String, UserSummary>>>,
}

impl StaticCredentialVerifier {
    /// Creates a verifier with no known tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues `token` for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Verifier`] when the lock is poisoned.
    pub fn issue(&self, token: impl Into<String>, user: UserSummary) -> Result<(), AuthError> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|err| AuthError::verifier(std::io::Error::other(err.to_string())))?;
        tokens.insert(token.into(), user);
        Ok(())
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let tokens = self
            .tokens
            .read()
            .map_err(|err| AuthError::verifier(std::io::Error::other(err.to_string())))?;
        let user = tokens
            .get(token)
            .ok_or_else(|| AuthError::InvalidCredential("unknown token".to_owned()))?;
        if !user.is_active() {
            return Err(AuthError::InactiveIdentity(user.id()));
        }
        Ok(VerifiedIdentity::new(
            user.id(),
            user.email(),
            user.name(),
            user.role(),
        ))
    }
}
