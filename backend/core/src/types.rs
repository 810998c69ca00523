use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier of a chat participant (a user account on the transport).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

/// Identifier of the containing scope (a guild / server / workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u64);

/// Identifier of the channel a message was posted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

macro_rules! display_id {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        })*
    };
}

display_id!(EntityId, ScopeId, ChannelId);

// ---------------------------------------------------------------------------
// Permission levels
// ---------------------------------------------------------------------------

/// Ordered permission levels. A command declares a floor; an invoker passes
/// the floor when their level compares greater or equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Ban-equivalent restriction. Never passes any floor.
    Banned,
    /// Any account on the transport, registered or not.
    User,
    /// A registered player.
    #[default]
    Player,
    /// Administrator of the containing scope.
    ScopeAdmin,
    /// Owner-grade administrator of the containing scope.
    ScopeOwner,
    /// Bot-wide moderator.
    Mod,
    /// Bot-wide administrator.
    Admin,
    /// Bot owner.
    Owner,
}

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 8] = [
        PermissionLevel::Banned,
        PermissionLevel::User,
        PermissionLevel::Player,
        PermissionLevel::ScopeAdmin,
        PermissionLevel::ScopeOwner,
        PermissionLevel::Mod,
        PermissionLevel::Admin,
        PermissionLevel::Owner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Banned => "banned",
            PermissionLevel::User => "user",
            PermissionLevel::Player => "player",
            PermissionLevel::ScopeAdmin => "scope_admin",
            PermissionLevel::ScopeOwner => "scope_owner",
            PermissionLevel::Mod => "mod",
            PermissionLevel::Admin => "admin",
            PermissionLevel::Owner => "owner",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        PermissionLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == lower)
            .ok_or_else(|| format!("unknown permission level `{s}`"))
    }
}

// ---------------------------------------------------------------------------
// Resolved references
// ---------------------------------------------------------------------------

/// A participant as seen by a specific viewer.
///
/// `active` is computed by the directory for the viewer that asked: an entity
/// that exists but is not a participant the viewer may act on is inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    pub name: String,
    pub active: bool,
}

/// A named team (a category of entity looked up by name, not id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(PermissionLevel::Banned < PermissionLevel::User);
        assert!(PermissionLevel::Player < PermissionLevel::ScopeAdmin);
        assert!(PermissionLevel::Mod < PermissionLevel::Owner);
    }

    #[test]
    fn level_round_trips_through_str() {
        for level in PermissionLevel::ALL {
            assert_eq!(level.as_str().parse::<PermissionLevel>().unwrap(), level);
        }
        assert!("wizard".parse::<PermissionLevel>().is_err());
    }

    #[test]
    fn default_level_is_player() {
        assert_eq!(PermissionLevel::default(), PermissionLevel::Player);
    }

    #[test]
    fn level_serde_uses_snake_case() {
        let json = serde_json::to_string(&PermissionLevel::ScopeAdmin).unwrap();
        assert_eq!(json, "\"scope_admin\"");
    }
}
