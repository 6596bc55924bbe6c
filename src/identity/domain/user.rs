//! Read-side identity summaries.

use super::{Role, TeamId, UserId};
use serde::{Deserialize, Serialize};

/// Identity summary owned by the external user-management collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    id: UserId,
    email: String,
    name: String,
    role: Role,
    active: bool,
    team_id: Option<TeamId>,
}

impl UserSummary {
    /// Creates an active identity summary without a team.
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            role,
            active: true,
            team_id: None,
        }
    }

    /// Sets the team reference.
    #[must_use]
    pub const fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub const fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the e-mail address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns whether the identity is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the team reference, if any.
    #[must_use]
    pub const fn team_id(&self) -> Option<TeamId> {
        self.team_id
    }

    /// Returns the acting view of this identity.
    #[must_use]
    pub fn as_actor(&self) -> Actor {
        Actor {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
            active: self.active,
        }
    }
}

/// The identity performing a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Acting user.
    pub id: UserId,
    /// Display name used in event attribution.
    pub name: String,
    /// Role at the time of the request.
    pub role: Role,
    /// Whether the identity is active.
    pub active: bool,
}

impl Actor {
    /// Creates an active actor.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            active: true,
        }
    }
}

impl From<&UserSummary> for Actor {
    fn from(user: &UserSummary) -> Self {
        user.as_actor()
    }
}
