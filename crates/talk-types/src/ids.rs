//! Integer identities for Talk entities
//!
//! Every entity lives in an arena keyed by a positive integer assigned by the
//! persistence layer. The newtypes keep a group id from being passed where an
//! idea id is expected.

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identity of a user, as supplied by the identity resolver
    UserId
);
entity_id!(
    /// Identity of a group
    GroupId
);
entity_id!(
    /// Identity of an idea
    IdeaId
);
entity_id!(
    /// Identity of an idea link
    LinkId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(GroupId::new(42).to_string(), "42");
        assert_eq!(IdeaId::from(7).get(), 7);
    }

    #[test]
    fn test_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&UserId::new(10)).unwrap();
        assert_eq!(json, "10");
        let back: UserId = serde_json::from_str("10").unwrap();
        assert_eq!(back, UserId::new(10));
    }

    #[test]
    fn test_id_ordering() {
        assert!(IdeaId::new(3) < IdeaId::new(9));
    }
}
