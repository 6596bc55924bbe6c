//! Port contracts for identity lookup and credential verification.

pub mod credentials;
pub mod directory;

pub use credentials::{AuthError, CredentialVerifier, VerifiedIdentity};
pub use directory::{UserDirectory, UserDirectoryError, UserDirectoryResult};

#[cfg(test)]
pub use credentials::MockCredentialVerifier;
#[cfg(test)]
pub use directory::MockUserDirectory;
