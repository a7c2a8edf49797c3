//! Idea Lifecycle Engine.
//!
//! Ideas move `raw → refining → distilled → actionable` through explicit
//! promotion only. Every mutation after creation is reserved to the author
//! and requires the idea to still be live; soft-deleted ideas are gone for
//! all writes, including a second delete.

use crate::error::{TalkError, TalkResult};
use crate::gate::{enforce, Action, Capabilities};
use crate::lookup::{load_group, load_live_idea, non_empty, require_user, role_of};
use chrono::Utc;
use std::sync::Arc;
use talk_storage::TalkStorage;
use talk_types::{Actor, GroupId, Idea, IdeaCategory, IdeaId, IdeaSource, IdeaStatus, NewIdea};
use tracing::info;

/// Input for `save`
#[derive(Clone, Debug)]
pub struct IdeaDraft {
    pub group_id: GroupId,
    pub content: String,
    pub category: IdeaCategory,
    pub source: IdeaSource,
    pub parent_id: Option<IdeaId>,
}

impl IdeaDraft {
    pub fn new(group_id: GroupId, content: impl Into<String>) -> Self {
        Self {
            group_id,
            content: content.into(),
            category: IdeaCategory::default(),
            source: IdeaSource::default(),
            parent_id: None,
        }
    }

    pub fn with_category(mut self, category: IdeaCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_source(mut self, source: IdeaSource) -> Self {
        self.source = source;
        self
    }

    pub fn reply_to(mut self, parent: IdeaId) -> Self {
        self.parent_id = Some(parent);
        self
    }
}

pub struct IdeaEngine {
    store: Arc<dyn TalkStorage>,
}

impl IdeaEngine {
    pub fn new(store: Arc<dyn TalkStorage>) -> Self {
        Self { store }
    }

    /// Author a new idea in a group the actor contributes to.
    pub async fn save(&self, actor: Actor, draft: IdeaDraft) -> TalkResult<Idea> {
        let user = require_user(actor)?;
        let group = load_group(self.store.as_ref(), draft.group_id).await?;
        let role = role_of(self.store.as_ref(), group.id, actor).await?;
        enforce(Action::SaveIdea, &Capabilities::of(actor).with_role(role))?;

        let content = non_empty("content", &draft.content)?;
        if !group.status.accepts_ideas() {
            return Err(TalkError::validation(format!(
                "group {} is {} and no longer accepts ideas",
                group.id, group.status
            )));
        }

        let mut new_idea = NewIdea::new(group.id, user, content)
            .with_category(draft.category)
            .with_source(draft.source);
        if let Some(parent_id) = draft.parent_id {
            let parent = load_live_idea(self.store.as_ref(), parent_id).await?;
            if parent.group_id != group.id {
                return Err(TalkError::validation(format!(
                    "parent idea {} belongs to another group",
                    parent.id
                )));
            }
            new_idea = new_idea.with_parent(parent.id);
        }

        let idea = self.store.insert_idea(new_idea, Utc::now()).await?;
        info!(
            idea_id = %idea.id,
            group_id = %group.id,
            actor = %user,
            category = %idea.category,
            "idea saved"
        );
        Ok(idea)
    }

    /// Replace an idea's content.
    pub async fn edit(&self, actor: Actor, idea_id: IdeaId, content: &str) -> TalkResult<Idea> {
        let idea = self.authorize(actor, idea_id, Action::EditIdea).await?;
        let content = non_empty("content", content)?;

        let edited = self.store.edit_idea(idea.id, content, Utc::now()).await?;
        info!(idea_id = %idea.id, edit_count = edited.edit_count, "idea edited");
        Ok(edited)
    }

    /// Soft-delete an idea. A second delete is rejected.
    pub async fn delete(&self, actor: Actor, idea_id: IdeaId) -> TalkResult<Idea> {
        let idea = self.authorize(actor, idea_id, Action::DeleteIdea).await?;
        let deleted = self.store.soft_delete_idea(idea.id, Utc::now()).await?;
        info!(idea_id = %idea.id, group_id = %idea.group_id, "idea deleted");
        Ok(deleted)
    }

    /// Advance an idea to a later status.
    pub async fn promote(
        &self,
        actor: Actor,
        idea_id: IdeaId,
        status: IdeaStatus,
    ) -> TalkResult<Idea> {
        let idea = self.authorize(actor, idea_id, Action::PromoteIdea).await?;
        if !idea.status.can_promote_to(status) {
            return Err(TalkError::validation(format!(
                "cannot move idea {} from {} to {}",
                idea.id, idea.status, status
            )));
        }

        let promoted = self
            .store
            .transition_status(idea.id, idea.status, status, Utc::now())
            .await?;
        info!(idea_id = %idea.id, from = %idea.status, to = %status, "idea promoted");
        Ok(promoted)
    }

    /// Set shareability, or flip it when `shareable` is `None`.
    pub async fn toggle_shareable(
        &self,
        actor: Actor,
        idea_id: IdeaId,
        shareable: Option<bool>,
    ) -> TalkResult<Idea> {
        let idea = self
            .authorize(actor, idea_id, Action::ToggleShareable)
            .await?;
        let shareable = shareable.unwrap_or(!idea.shareable);
        let updated = self
            .store
            .set_shareable(idea.id, shareable, Utc::now())
            .await?;
        info!(idea_id = %idea.id, shareable, "idea shareability changed");
        Ok(updated)
    }

    async fn authorize(&self, actor: Actor, idea_id: IdeaId, action: Action) -> TalkResult<Idea> {
        let user = require_user(actor)?;
        let idea = load_live_idea(self.store.as_ref(), idea_id).await?;
        enforce(
            action,
            &Capabilities::of(actor).with_authorship(idea.is_authored_by(user)),
        )?;
        Ok(idea)
    }
}
