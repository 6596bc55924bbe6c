//! Credential verification for transport-level connections.

use crate::identity::domain::{Role, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Identity resolved from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Authenticated user.
    pub id: UserId,
    /// E-mail address echoed in the connection confirmation.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role used to derive room membership.
    pub role: Role,
}

impl VerifiedIdentity {
    /// Creates a verified identity.
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            role,
        }
    }
}

/// Verifies connection credentials. Called once per connection and never
/// cached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Resolves the identity behind a credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the credential is rejected or the verifier
    /// backend fails.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError>;
}

/// Connection-level authentication failures. Each one ends with the
/// transport connection being closed; none are retried.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The client connected without presenting a credential.
    #[error("no credential presented")]
    MissingCredential,

    /// The client did not present a credential within the allowed window.
    #[error("credential not presented within {0:?}")]
    TimedOut(std::time::Duration),

    /// The credential was rejected.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The credential belongs to a deactivated identity.
    #[error("identity {0} is inactive")]
    InactiveIdentity(UserId),

    /// The verifier backend failed.
    #[error("credential verifier error: {0}")]
    Verifier(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuthError {
    /// Wraps a verifier backend error.
    pub fn verifier(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Verifier(Arc::new(err))
    }
}
