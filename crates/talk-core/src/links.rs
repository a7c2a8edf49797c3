//! Link Graph Manager: typed, symmetric relations between idea pairs.

use crate::error::{TalkError, TalkResult};
use crate::gate::{enforce, Action, Capabilities};
use crate::lookup::{load_live_idea, require_user};
use chrono::Utc;
use std::sync::Arc;
use talk_storage::TalkStorage;
use talk_types::{Actor, IdeaId, IdeaLink, NewIdeaLink, DEFAULT_LINK_TYPE};
use tracing::info;

pub struct LinkGraph {
    store: Arc<dyn TalkStorage>,
}

impl LinkGraph {
    pub fn new(store: Arc<dyn TalkStorage>) -> Self {
        Self { store }
    }

    /// Link two distinct live ideas. The pair is stored canonically, so
    /// `(a, b)` and `(b, a)` with the same type are the same link.
    pub async fn create_link(
        &self,
        actor: Actor,
        idea_a: IdeaId,
        idea_b: IdeaId,
        link_type: Option<&str>,
    ) -> TalkResult<IdeaLink> {
        let user = require_user(actor)?;
        enforce(Action::CreateLink, &Capabilities::of(actor))?;

        if idea_a == idea_b {
            return Err(TalkError::validation("an idea cannot be linked to itself"));
        }
        let link_type = match link_type {
            None => DEFAULT_LINK_TYPE,
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(TalkError::validation("link_type must not be empty"));
                }
                trimmed
            }
        };

        load_live_idea(self.store.as_ref(), idea_a).await?;
        load_live_idea(self.store.as_ref(), idea_b).await?;

        let link = self
            .store
            .insert_link(NewIdeaLink::new(idea_a, idea_b, link_type, user), Utc::now())
            .await?;
        info!(
            link_id = %link.id,
            idea_a = %link.idea_id_a,
            idea_b = %link.idea_id_b,
            link_type = %link.link_type,
            actor = %user,
            "ideas linked"
        );
        Ok(link)
    }

    /// All links touching an idea, in either position.
    pub async fn get_links(&self, actor: Actor, idea_id: IdeaId) -> TalkResult<Vec<IdeaLink>> {
        require_user(actor)?;
        enforce(Action::GetLinks, &Capabilities::of(actor))?;

        if self.store.get_idea(idea_id).await?.is_none() {
            return Err(TalkError::not_found(format!("idea {idea_id} not found")));
        }
        Ok(self.store.links_for_idea(idea_id).await?)
    }
}
