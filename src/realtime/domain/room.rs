//! Deterministic room names.

use crate::identity::domain::{Role, UserId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// A logical broadcast group. Rooms are never persisted; a room exists only
/// as the set of connections currently joined to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoomName {
    /// Every authenticated connection.
    Broadcast,
    /// Every connection of one role.
    Role(Role),
    /// Every connection of one identity.
    User(UserId),
    /// A manager's subtree.
    Manager(UserId),
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => f.write_str("broadcast"),
            Self::Role(role) => write!(f, "role-{role}"),
            Self::User(user) => write!(f, "user-{user}"),
            Self::Manager(manager) => write!(f, "manager-{manager}"),
        }
    }
}

impl FromStr for RoomName {
    type Err = ParseRoomNameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseRoomNameError(value.to_owned());
        if value == "broadcast" {
            return Ok(Self::Broadcast);
        }
        let (prefix, rest) = value.split_once('-').ok_or_else(invalid)?;
        match prefix {
            "role" => Role::try_from(rest).map(Self::Role).map_err(|_| invalid()),
            "user" => parse_user(rest).map(Self::User).ok_or_else(invalid),
            "manager" => parse_user(rest).map(Self::Manager).ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }
}

fn parse_user(raw: &str) -> Option<UserId> {
    Uuid::parse_str(raw).ok().map(UserId::from_uuid)
}

impl Serialize for RoomName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoomName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Error returned for strings that are not room names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid room name: {0}")]
pub struct ParseRoomNameError(pub String);
