//! Identity summaries consumed by the task and realtime cores.
//!
//! User management (credential issuance, profile editing, password hashing)
//! lives outside this crate. The core only reads an identity's role and
//! active flag, so this module exposes the read-side model plus the ports
//! through which identities are resolved:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - In-memory adapters in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
