//! Membership: who belongs to a group, and in which role

use crate::{GroupId, TypeError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Role held by a member within one group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Group-management authority
    Facilitator,
    /// May author and manage their own ideas
    #[default]
    Member,
    /// May view but not author
    Observer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Facilitator => "facilitator",
            Role::Member => "member",
            Role::Observer => "observer",
        }
    }

    pub fn is_facilitator(&self) -> bool {
        matches!(self, Role::Facilitator)
    }

    /// Whether this role may save ideas into its group
    pub fn can_author(&self) -> bool {
        matches!(self, Role::Facilitator | Role::Member)
    }
}

impl FromStr for Role {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facilitator" => Ok(Role::Facilitator),
            "member" => Ok(Role::Member),
            "observer" => Ok(Role::Observer),
            other => Err(TypeError::unknown(
                "role",
                other,
                "facilitator, member, observer",
            )),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record for a single member of a group.
///
/// Unique per (group, user).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(group_id: GroupId, user_id: UserId, role: Role) -> Self {
        Self {
            group_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }

    pub fn joined_at(mut self, at: DateTime<Utc>) -> Self {
        self.joined_at = at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Facilitator.can_author());
        assert!(Role::Member.can_author());
        assert!(!Role::Observer.can_author());
        assert!(Role::Facilitator.is_facilitator());
        assert!(!Role::Member.is_facilitator());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("observer".parse::<Role>().unwrap(), Role::Observer);
        assert_eq!("FACILITATOR".parse::<Role>().unwrap(), Role::Facilitator);
        let err = "admin".parse::<Role>().unwrap_err();
        assert!(err.to_string().contains("admin"));
    }

    #[test]
    fn test_membership_new() {
        let m = Membership::new(GroupId::new(1), UserId::new(2), Role::Member);
        assert_eq!(m.role, Role::Member);
        assert!(m.joined_at <= Utc::now());
    }
}
