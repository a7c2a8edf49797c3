//! Idea links: typed, symmetric relations between two ideas

use crate::{IdeaId, LinkId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default link type when the caller does not name one
pub const DEFAULT_LINK_TYPE: &str = "related";

/// Order an idea pair so that `(a, b)` and `(b, a)` map to the same key
pub fn canonical_pair(a: IdeaId, b: IdeaId) -> (IdeaId, IdeaId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A persisted link.
///
/// Stored canonically: `idea_id_a < idea_id_b`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdeaLink {
    pub id: LinkId,
    pub idea_id_a: IdeaId,
    pub idea_id_b: IdeaId,
    pub link_type: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl IdeaLink {
    pub fn touches(&self, idea: IdeaId) -> bool {
        self.idea_id_a == idea || self.idea_id_b == idea
    }

    /// The idea at the opposite end from `idea`
    pub fn other_end(&self, idea: IdeaId) -> Option<IdeaId> {
        if self.idea_id_a == idea {
            Some(self.idea_id_b)
        } else if self.idea_id_b == idea {
            Some(self.idea_id_a)
        } else {
            None
        }
    }

    /// Whether this link is the same relation as `(a, b, link_type)` in any order
    pub fn is_equivalent(&self, a: IdeaId, b: IdeaId, link_type: &str) -> bool {
        (self.idea_id_a, self.idea_id_b) == canonical_pair(a, b) && self.link_type == link_type
    }
}

/// Specification for a new link, already in canonical order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewIdeaLink {
    pub idea_id_a: IdeaId,
    pub idea_id_b: IdeaId,
    pub link_type: String,
    pub created_by: UserId,
}

impl NewIdeaLink {
    pub fn new(a: IdeaId, b: IdeaId, link_type: impl Into<String>, created_by: UserId) -> Self {
        let (low, high) = canonical_pair(a, b);
        Self {
            idea_id_a: low,
            idea_id_b: high,
            link_type: link_type.into(),
            created_by,
        }
    }

    pub fn is_self_link(&self) -> bool {
        self.idea_id_a == self.idea_id_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair() {
        let (a, b) = (IdeaId::new(9), IdeaId::new(4));
        assert_eq!(canonical_pair(a, b), (b, a));
        assert_eq!(canonical_pair(b, a), (b, a));
    }

    #[test]
    fn test_new_link_is_canonical() {
        let link = NewIdeaLink::new(IdeaId::new(12), IdeaId::new(3), "related", UserId::new(1));
        assert_eq!(link.idea_id_a, IdeaId::new(3));
        assert_eq!(link.idea_id_b, IdeaId::new(12));
        assert!(!link.is_self_link());
        assert!(NewIdeaLink::new(IdeaId::new(5), IdeaId::new(5), "related", UserId::new(1))
            .is_self_link());
    }

    #[test]
    fn test_other_end_and_equivalence() {
        let link = IdeaLink {
            id: LinkId::new(1),
            idea_id_a: IdeaId::new(3),
            idea_id_b: IdeaId::new(12),
            link_type: "related".into(),
            created_by: UserId::new(1),
            created_at: Utc::now(),
        };
        assert_eq!(link.other_end(IdeaId::new(3)), Some(IdeaId::new(12)));
        assert_eq!(link.other_end(IdeaId::new(12)), Some(IdeaId::new(3)));
        assert_eq!(link.other_end(IdeaId::new(4)), None);
        assert!(link.is_equivalent(IdeaId::new(12), IdeaId::new(3), "related"));
        assert!(!link.is_equivalent(IdeaId::new(12), IdeaId::new(3), "supports"));
        assert!(link.touches(IdeaId::new(12)));
    }
}
