//! Domain model for identities and roles.

mod ids;
mod role;
mod user;

pub use ids::{TeamId, UserId};
pub use role::{ParseRoleError, Role};
pub use user::{Actor, UserSummary};
