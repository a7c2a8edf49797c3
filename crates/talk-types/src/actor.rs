//! The acting identity threaded through every operation

use crate::UserId;
use serde::{Deserialize, Serialize};

/// Who is performing an action.
///
/// The identity resolver produces this per request; there is no ambient
/// "current user".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    /// No identity could be resolved
    #[default]
    Anonymous,
    /// A resolved user
    User(UserId),
}

impl Actor {
    pub fn user(id: impl Into<UserId>) -> Self {
        Actor::User(id.into())
    }

    /// Build an actor from an optional resolved id
    pub fn from_resolved(id: Option<UserId>) -> Self {
        id.map(Actor::User).unwrap_or(Actor::Anonymous)
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Anonymous => write!(f, "anonymous"),
            Actor::User(id) => write!(f, "user:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_resolved() {
        assert_eq!(Actor::from_resolved(None), Actor::Anonymous);
        assert_eq!(
            Actor::from_resolved(Some(UserId::new(5))),
            Actor::User(UserId::new(5))
        );
    }

    #[test]
    fn test_actor_accessors() {
        let actor = Actor::user(3);
        assert!(actor.is_authenticated());
        assert_eq!(actor.user_id(), Some(UserId::new(3)));
        assert_eq!(actor.to_string(), "user:3");
        assert!(!Actor::Anonymous.is_authenticated());
    }
}
