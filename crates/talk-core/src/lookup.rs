//! Loading helpers shared by the managers.

use crate::error::{TalkError, TalkResult};
use talk_storage::TalkStorage;
use talk_types::{Actor, Group, GroupId, Idea, IdeaId, Role, UserId};

pub(crate) fn require_user(actor: Actor) -> TalkResult<UserId> {
    actor.user_id().ok_or_else(TalkError::authentication)
}

pub(crate) async fn load_group(store: &dyn TalkStorage, group_id: GroupId) -> TalkResult<Group> {
    store
        .get_group(group_id)
        .await?
        .ok_or_else(|| TalkError::not_found(format!("group {group_id} not found")))
}

/// Load an idea that must still be live.
pub(crate) async fn load_live_idea(store: &dyn TalkStorage, idea_id: IdeaId) -> TalkResult<Idea> {
    match store.get_idea(idea_id).await? {
        Some(idea) if !idea.is_deleted() => Ok(idea),
        Some(_) => Err(TalkError::not_found(format!("idea {idea_id} has been deleted"))),
        None => Err(TalkError::not_found(format!("idea {idea_id} not found"))),
    }
}

pub(crate) async fn role_of(
    store: &dyn TalkStorage,
    group_id: GroupId,
    actor: Actor,
) -> TalkResult<Option<Role>> {
    match actor.user_id() {
        Some(user) => Ok(store
            .get_membership(group_id, user)
            .await?
            .map(|m| m.role)),
        None => Ok(None),
    }
}

/// Reject empty or whitespace-only text, returning it trimmed.
pub(crate) fn non_empty<'a>(field: &str, value: &'a str) -> TalkResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TalkError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}
