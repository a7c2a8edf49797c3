//! Group records and the values that describe them

use crate::{GroupId, TypeError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Whether a group can be joined without an invitation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Anyone may join as a member
    #[default]
    Open,
    /// Not self-service joinable
    Closed,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Open => "open",
            AccessLevel::Closed => "closed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, AccessLevel::Open)
    }
}

impl FromStr for AccessLevel {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(AccessLevel::Open),
            "closed" => Ok(AccessLevel::Closed),
            other => Err(TypeError::unknown("access level", other, "open, closed")),
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deliberation phase of a group, managed by its facilitators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Gathering members, not yet deliberating
    #[default]
    Forming,
    /// Members are contributing ideas
    Active,
    /// Ideas are being consolidated
    Crystallizing,
    /// Deliberation concluded
    Crystallized,
    /// Read-only; no new ideas accepted
    Archived,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Forming => "forming",
            GroupStatus::Active => "active",
            GroupStatus::Crystallizing => "crystallizing",
            GroupStatus::Crystallized => "crystallized",
            GroupStatus::Archived => "archived",
        }
    }

    /// Whether new ideas may be saved into a group in this phase
    pub fn accepts_ideas(&self) -> bool {
        !matches!(self, GroupStatus::Archived)
    }
}

impl FromStr for GroupStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forming" => Ok(GroupStatus::Forming),
            "active" => Ok(GroupStatus::Active),
            "crystallizing" => Ok(GroupStatus::Crystallizing),
            "crystallized" => Ok(GroupStatus::Crystallized),
            "archived" => Ok(GroupStatus::Archived),
            other => Err(TypeError::unknown(
                "group status",
                other,
                "forming, active, crystallizing, crystallized, archived",
            )),
        }
    }
}

impl std::fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted group
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique group identifier
    pub id: GroupId,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Normalized tag set
    pub tags: Vec<String>,
    /// Self-service joinability
    pub access_level: AccessLevel,
    /// Deliberation phase
    pub status: GroupStatus,
    /// Enclosing group, for sub-groups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<GroupId>,
    /// The user who created the group
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Specification for creating a new group
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub access_level: AccessLevel,
    pub parent_group_id: Option<GroupId>,
    /// Becomes the first facilitator
    pub created_by: UserId,
}

impl NewGroup {
    pub fn new(name: impl Into<String>, created_by: UserId) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            access_level: AccessLevel::Open,
            parent_group_id: None,
            created_by,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }

    pub fn with_parent(mut self, parent: GroupId) -> Self {
        self.parent_group_id = Some(parent);
        self
    }
}

/// Partial update of a group's mutable fields
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupPatch {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub access_level: Option<AccessLevel>,
    pub status: Option<GroupStatus>,
}

impl GroupPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.tags.is_none()
            && self.access_level.is_none()
            && self.status.is_none()
    }

    /// Apply this patch to a group in place
    pub fn apply(&self, group: &mut Group, at: DateTime<Utc>) {
        if let Some(description) = &self.description {
            group.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            group.tags = normalize_tags(tags.clone());
        }
        if let Some(access_level) = self.access_level {
            group.access_level = access_level;
        }
        if let Some(status) = self.status {
            group.status = status;
        }
        group.updated_at = at;
    }
}

/// Trim, drop empties and de-duplicate tags, keeping first-seen order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

/// Split a comma separated tag string ("test, harness, automated")
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}
