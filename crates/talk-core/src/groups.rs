//! Group Manager: group CRUD and the membership lifecycle.

use crate::error::{TalkError, TalkResult};
use crate::gate::{enforce, Action, Capabilities};
use crate::lookup::{load_group, non_empty, require_user, role_of};
use chrono::Utc;
use std::sync::Arc;
use talk_storage::TalkStorage;
use talk_types::{
    normalize_tags, AccessLevel, Actor, Group, GroupId, GroupPatch, Membership, NewGroup, Role,
    UserId,
};
use tracing::info;

/// Input for `create_group`
#[derive(Clone, Debug, Default)]
pub struct GroupDraft {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub access_level: AccessLevel,
    pub parent_group_id: Option<GroupId>,
}

impl GroupDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn closed(mut self) -> Self {
        self.access_level = AccessLevel::Closed;
        self
    }

    pub fn under(mut self, parent: GroupId) -> Self {
        self.parent_group_id = Some(parent);
        self
    }
}

/// Creates groups and manages who belongs to them.
pub struct GroupManager {
    store: Arc<dyn TalkStorage>,
}

impl GroupManager {
    pub fn new(store: Arc<dyn TalkStorage>) -> Self {
        Self { store }
    }

    /// Create a group; the actor becomes its first facilitator.
    pub async fn create_group(&self, actor: Actor, draft: GroupDraft) -> TalkResult<Group> {
        let user = require_user(actor)?;
        enforce(Action::CreateGroup, &Capabilities::of(actor))?;
        let name = non_empty("name", &draft.name)?;

        let mut new_group = NewGroup::new(name, user)
            .with_description(draft.description.trim())
            .with_tags(draft.tags)
            .with_access_level(draft.access_level);

        if let Some(parent_id) = draft.parent_group_id {
            let parent = load_group(self.store.as_ref(), parent_id).await?;
            let role = role_of(self.store.as_ref(), parent.id, actor).await?;
            enforce(
                Action::CreateSubGroup,
                &Capabilities::of(actor).with_role(role),
            )?;
            new_group = new_group.with_parent(parent.id);
        }

        let (group, _) = self.store.create_group(new_group, Utc::now()).await?;
        info!(group_id = %group.id, actor = %user, access_level = %group.access_level, "group created");
        Ok(group)
    }

    /// Change description, tags, access level or status. Facilitators only.
    pub async fn update_group(
        &self,
        actor: Actor,
        group_id: GroupId,
        mut patch: GroupPatch,
    ) -> TalkResult<Group> {
        let user = require_user(actor)?;
        let group = load_group(self.store.as_ref(), group_id).await?;
        let role = role_of(self.store.as_ref(), group.id, actor).await?;
        enforce(Action::UpdateGroup, &Capabilities::of(actor).with_role(role))?;

        if patch.is_empty() {
            return Err(TalkError::validation("no fields to update"));
        }
        patch.tags = patch.tags.map(normalize_tags);
        patch.description = patch.description.map(|d| d.trim().to_string());

        let updated = self.store.update_group(group.id, &patch, Utc::now()).await?;
        info!(group_id = %group.id, actor = %user, status = %updated.status, "group updated");
        Ok(updated)
    }

    /// Remove a group with its memberships, ideas and links. Facilitators only.
    pub async fn delete_group(&self, actor: Actor, group_id: GroupId) -> TalkResult<()> {
        let user = require_user(actor)?;
        let group = load_group(self.store.as_ref(), group_id).await?;
        let role = role_of(self.store.as_ref(), group.id, actor).await?;
        enforce(Action::DeleteGroup, &Capabilities::of(actor).with_role(role))?;

        self.store.delete_group(group.id).await?;
        info!(group_id = %group.id, actor = %user, "group deleted");
        Ok(())
    }

    /// Self-service join of an open group as a member.
    pub async fn join_group(&self, actor: Actor, group_id: GroupId) -> TalkResult<Membership> {
        let user = require_user(actor)?;
        let group = load_group(self.store.as_ref(), group_id).await?;
        let role = role_of(self.store.as_ref(), group.id, actor).await?;
        enforce(
            Action::JoinGroup,
            &Capabilities::of(actor)
                .with_role(role)
                .with_access_level(group.access_level),
        )?;

        let membership = Membership::new(group.id, user, Role::Member).joined_at(Utc::now());
        self.store.add_membership(membership.clone()).await?;
        info!(group_id = %group.id, actor = %user, "member joined");
        Ok(membership)
    }

    /// Drop the actor's own membership.
    pub async fn leave_group(&self, actor: Actor, group_id: GroupId) -> TalkResult<Membership> {
        let user = require_user(actor)?;
        let group = load_group(self.store.as_ref(), group_id).await?;
        let role = role_of(self.store.as_ref(), group.id, actor).await?;
        enforce(Action::LeaveGroup, &Capabilities::of(actor).with_role(role))?;

        let removed = self.store.remove_membership(group.id, user).await?;
        info!(group_id = %group.id, actor = %user, role = %removed.role, "member left");
        Ok(removed)
    }

    /// Reassign another member's role. Facilitators only.
    pub async fn update_member(
        &self,
        actor: Actor,
        group_id: GroupId,
        target: UserId,
        new_role: Role,
    ) -> TalkResult<Membership> {
        let user = require_user(actor)?;
        let group = load_group(self.store.as_ref(), group_id).await?;
        let role = role_of(self.store.as_ref(), group.id, actor).await?;
        enforce(Action::UpdateMember, &Capabilities::of(actor).with_role(role))?;

        let updated = self.store.set_role(group.id, target, new_role).await?;
        info!(
            group_id = %group.id,
            actor = %user,
            target = %target,
            role = %updated.role,
            "member role updated"
        );
        Ok(updated)
    }
}
