//! Per-action request parameters.
//!
//! Parameters arrive as query strings, JSON bodies or both, so ids and flags
//! are accepted either as JSON scalars or as their string spelling.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub access_level: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_id")]
    pub parent_group_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    #[serde(deserialize_with = "flex::id")]
    pub group_id: i64,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub access_level: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroupRef {
    #[serde(deserialize_with = "flex::id")]
    pub group_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    #[serde(deserialize_with = "flex::id")]
    pub group_id: i64,
    #[serde(deserialize_with = "flex::id")]
    pub user_id: i64,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListGroupsRequest {
    #[serde(default, deserialize_with = "flex::opt_flag")]
    pub mine: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(deserialize_with = "flex::id")]
    pub group_id: i64,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_id")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    #[serde(deserialize_with = "flex::id")]
    pub idea_id: i64,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdeaRef {
    #[serde(deserialize_with = "flex::id")]
    pub idea_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    #[serde(deserialize_with = "flex::id")]
    pub idea_id: i64,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleShareableRequest {
    #[serde(deserialize_with = "flex::id")]
    pub idea_id: i64,
    /// Absent means flip the current value
    #[serde(default, deserialize_with = "flex::opt_flag")]
    pub shareable: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    #[serde(deserialize_with = "flex::id")]
    pub idea_id_a: i64,
    #[serde(deserialize_with = "flex::id")]
    pub idea_id_b: i64,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub link_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryRequest {
    #[serde(default, deserialize_with = "flex::opt_id")]
    pub group_id: Option<i64>,
    #[serde(default, deserialize_with = "flex::opt_id")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "flex::opt_text")]
    pub category: Option<String>,
}

/// Lenient scalar readers for mixed query-string and JSON input.
pub(crate) mod flex {
    use serde::{de, Deserialize, Deserializer};
    use serde_json::Value;
    use talk_types::parse_tag_list;

    fn as_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn is_blank(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(d)?;
        as_i64(&value)
            .ok_or_else(|| de::Error::custom(format!("expected an integer id, got {value}")))
    }

    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(d)?;
        if is_blank(&value) {
            return Ok(None);
        }
        as_i64(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected an integer, got {value}")))
    }

    pub fn opt_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        let value = Value::deserialize(d)?;
        match &value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(*b)),
            Value::Number(n) => Ok(Some(n.as_i64() != Some(0))),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(None),
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(de::Error::custom(format!("expected a boolean, got {value}"))),
            },
            _ => Err(de::Error::custom(format!("expected a boolean, got {value}"))),
        }
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Value::deserialize(d)?;
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(de::Error::custom(format!("expected text, got {other}"))),
        }
    }

    /// A comma-separated string or an array of strings.
    pub fn opt_tags<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
        let value = Value::deserialize(d)?;
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(parse_tag_list(&s))),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(de::Error::custom(format!("expected a tag, got {other}"))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            other => Err(de::Error::custom(format!("expected tags, got {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_accept_numbers_and_strings() {
        let req: IdeaRef = serde_json::from_value(json!({"idea_id": "12"})).unwrap();
        assert_eq!(req.idea_id, 12);
        let req: IdeaRef = serde_json::from_value(json!({"idea_id": 12})).unwrap();
        assert_eq!(req.idea_id, 12);
        assert!(serde_json::from_value::<IdeaRef>(json!({"idea_id": "twelve"})).is_err());
        assert!(serde_json::from_value::<IdeaRef>(json!({})).is_err());
    }

    #[test]
    fn flags_and_tags() {
        let req: ListGroupsRequest = serde_json::from_value(json!({"mine": "1"})).unwrap();
        assert_eq!(req.mine, Some(true));
        let req: ToggleShareableRequest =
            serde_json::from_value(json!({"idea_id": 3, "shareable": 0})).unwrap();
        assert_eq!(req.shareable, Some(false));

        let req: CreateGroupRequest =
            serde_json::from_value(json!({"name": "G", "tags": "test, harness, automated"}))
                .unwrap();
        assert_eq!(
            req.tags,
            Some(vec!["test".into(), "harness".into(), "automated".into()])
        );
        let req: CreateGroupRequest =
            serde_json::from_value(json!({"name": "G", "tags": ["a", "b"]})).unwrap();
        assert_eq!(req.tags, Some(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn blank_optional_ids_are_absent() {
        let req: HistoryRequest =
            serde_json::from_value(json!({"group_id": "", "limit": "20"})).unwrap();
        assert_eq!(req.group_id, None);
        assert_eq!(req.limit, Some(20));
    }
}
