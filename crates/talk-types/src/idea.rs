//! Ideas: atomic contributions with a maturity status

use crate::{GroupId, IdeaId, TypeError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maturity of an idea.
///
/// Variants are declared in promotion order so the derived `Ord` matches the
/// lifecycle `raw < refining < distilled < actionable`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    #[default]
    Raw,
    Refining,
    Distilled,
    Actionable,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::Raw => "raw",
            IdeaStatus::Refining => "refining",
            IdeaStatus::Distilled => "distilled",
            IdeaStatus::Actionable => "actionable",
        }
    }

    /// Whether moving from `self` to `to` is a forward promotion
    pub fn can_promote_to(&self, to: IdeaStatus) -> bool {
        to > *self
    }
}

impl FromStr for IdeaStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(IdeaStatus::Raw),
            "refining" => Ok(IdeaStatus::Refining),
            "distilled" => Ok(IdeaStatus::Distilled),
            "actionable" => Ok(IdeaStatus::Actionable),
            other => Err(TypeError::unknown(
                "idea status",
                other,
                "raw, refining, distilled, actionable",
            )),
        }
    }
}

impl std::fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of contribution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdeaCategory {
    #[default]
    Idea,
    Decision,
    Todo,
    Note,
}

impl IdeaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaCategory::Idea => "idea",
            IdeaCategory::Decision => "decision",
            IdeaCategory::Todo => "todo",
            IdeaCategory::Note => "note",
        }
    }

    /// Parse a category, falling back to `Idea` for unknown input
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for IdeaCategory {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idea" => Ok(IdeaCategory::Idea),
            "decision" => Ok(IdeaCategory::Decision),
            "todo" => Ok(IdeaCategory::Todo),
            "note" => Ok(IdeaCategory::Note),
            other => Err(TypeError::unknown(
                "category",
                other,
                "idea, decision, todo, note",
            )),
        }
    }
}

impl std::fmt::Display for IdeaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel an idea was captured through
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdeaSource {
    #[default]
    Web,
    Voice,
    Api,
}

impl IdeaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaSource::Web => "web",
            IdeaSource::Voice => "voice",
            IdeaSource::Api => "api",
        }
    }

    /// Parse a source, falling back to `Api` for unknown input
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(IdeaSource::Api)
    }
}

impl FromStr for IdeaSource {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(IdeaSource::Web),
            "voice" => Ok(IdeaSource::Voice),
            "api" => Ok(IdeaSource::Api),
            other => Err(TypeError::unknown("source", other, "web, voice, api")),
        }
    }
}

impl std::fmt::Display for IdeaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted idea
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: IdeaId,
    pub group_id: GroupId,
    /// Immutable once created
    pub author_id: UserId,
    /// Parent idea when this is a reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<IdeaId>,
    pub content: String,
    pub category: IdeaCategory,
    pub source: IdeaSource,
    pub status: IdeaStatus,
    pub shareable: bool,
    /// Number of edits applied since creation
    pub edit_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Idea {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.author_id == user
    }
}

/// Specification for saving a new idea
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewIdea {
    pub group_id: GroupId,
    pub author_id: UserId,
    pub parent_id: Option<IdeaId>,
    pub content: String,
    pub category: IdeaCategory,
    pub source: IdeaSource,
}

impl NewIdea {
    pub fn new(group_id: GroupId, author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            group_id,
            author_id,
            parent_id: None,
            content: content.into(),
            category: IdeaCategory::default(),
            source: IdeaSource::default(),
        }
    }

    pub fn with_parent(mut self, parent: IdeaId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn with_category(mut self, category: IdeaCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_source(mut self, source: IdeaSource) -> Self {
        self.source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering() {
        assert!(IdeaStatus::Raw < IdeaStatus::Refining);
        assert!(IdeaStatus::Distilled < IdeaStatus::Actionable);
        assert!(IdeaStatus::Raw.can_promote_to(IdeaStatus::Actionable));
        assert!(!IdeaStatus::Refining.can_promote_to(IdeaStatus::Refining));
        assert!(!IdeaStatus::Distilled.can_promote_to(IdeaStatus::Raw));
    }

    #[test]
    fn test_lenient_parsing() {
        assert_eq!(IdeaCategory::parse_lenient("todo"), IdeaCategory::Todo);
        assert_eq!(IdeaCategory::parse_lenient("rant"), IdeaCategory::Idea);
        assert_eq!(IdeaSource::parse_lenient("voice"), IdeaSource::Voice);
        assert_eq!(IdeaSource::parse_lenient("fax"), IdeaSource::Api);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&IdeaStatus::Refining).unwrap();
        assert_eq!(json, "\"refining\"");
        let parsed: IdeaStatus = serde_json::from_str("\"actionable\"").unwrap();
        assert_eq!(parsed, IdeaStatus::Actionable);
    }

    #[test]
    fn test_new_idea_builder() {
        let idea = NewIdea::new(GroupId::new(1), UserId::new(2), "WiFi upgrades")
            .with_category(IdeaCategory::Decision)
            .with_parent(IdeaId::new(9));
        assert_eq!(idea.category, IdeaCategory::Decision);
        assert_eq!(idea.parent_id, Some(IdeaId::new(9)));
        assert_eq!(idea.source, IdeaSource::Web);
    }
}
