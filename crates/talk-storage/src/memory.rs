//! In-memory reference implementation for Talk storage traits.
//!
//! All tables live behind one lock, so every compound operation (group plus
//! facilitator, uniqueness check plus insert, cascade delete) is atomic with
//! respect to concurrent requests. Identities are assigned from per-table
//! counters, arena style.

use crate::traits::{GroupStore, IdeaFilter, IdeaStore, LinkStore, MembershipStore, QueryWindow};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use talk_types::{
    Group, GroupId, GroupPatch, Idea, IdeaId, IdeaLink, IdeaStatus, LinkId, Membership, NewGroup,
    NewIdea, NewIdeaLink, Role, UserId,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    groups: BTreeMap<GroupId, Group>,
    members: BTreeMap<(GroupId, UserId), Membership>,
    ideas: BTreeMap<IdeaId, Idea>,
    links: BTreeMap<LinkId, IdeaLink>,
    link_index: BTreeSet<(IdeaId, IdeaId, String)>,
    next_group: i64,
    next_idea: i64,
    next_link: i64,
}

impl Tables {
    fn facilitator_count(&self, group_id: GroupId) -> usize {
        self.members
            .values()
            .filter(|m| m.group_id == group_id && m.role.is_facilitator())
            .count()
    }

    fn live_idea_mut(&mut self, idea_id: IdeaId) -> StorageResult<&mut Idea> {
        match self.ideas.get_mut(&idea_id) {
            Some(idea) if !idea.is_deleted() => Ok(idea),
            Some(_) => Err(StorageError::NotFound(format!("idea {} is deleted", idea_id))),
            None => Err(StorageError::NotFound(format!("idea {} not found", idea_id))),
        }
    }

    fn is_live(&self, idea_id: IdeaId) -> bool {
        self.ideas
            .get(&idea_id)
            .map(|i| !i.is_deleted())
            .unwrap_or(false)
    }
}

/// In-memory Talk storage adapter.
#[derive(Debug, Default)]
pub struct InMemoryTalkStorage {
    tables: RwLock<Tables>,
}

impl InMemoryTalkStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupStore for InMemoryTalkStorage {
    async fn create_group(
        &self,
        group: NewGroup,
        created_at: DateTime<Utc>,
    ) -> StorageResult<(Group, Membership)> {
        let mut tables = self.tables.write().await;

        if let Some(parent) = group.parent_group_id {
            if !tables.groups.contains_key(&parent) {
                return Err(StorageError::NotFound(format!(
                    "parent group {} not found",
                    parent
                )));
            }
        }

        tables.next_group += 1;
        let id = GroupId::new(tables.next_group);
        let record = Group {
            id,
            name: group.name,
            description: group.description,
            tags: group.tags,
            access_level: group.access_level,
            status: Default::default(),
            parent_group_id: group.parent_group_id,
            created_by: group.created_by,
            created_at,
            updated_at: created_at,
        };
        let facilitator =
            Membership::new(id, group.created_by, Role::Facilitator).joined_at(created_at);

        tables.groups.insert(id, record.clone());
        tables
            .members
            .insert((id, group.created_by), facilitator.clone());
        Ok((record, facilitator))
    }

    async fn get_group(&self, group_id: GroupId) -> StorageResult<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.get(&group_id).cloned())
    }

    async fn list_groups(&self) -> StorageResult<Vec<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().rev().cloned().collect())
    }

    async fn list_sub_groups(&self, parent: GroupId) -> StorageResult<Vec<Group>> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .values()
            .filter(|g| g.parent_group_id == Some(parent))
            .cloned()
            .collect())
    }

    async fn update_group(
        &self,
        group_id: GroupId,
        patch: &GroupPatch,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Group> {
        let mut tables = self.tables.write().await;
        let group = tables
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| StorageError::NotFound(format!("group {} not found", group_id)))?;
        patch.apply(group, updated_at);
        Ok(group.clone())
    }

    async fn delete_group(&self, group_id: GroupId) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&group_id).is_none() {
            return Err(StorageError::NotFound(format!(
                "group {} not found",
                group_id
            )));
        }

        tables.members.retain(|(g, _), _| *g != group_id);

        let doomed: BTreeSet<IdeaId> = tables
            .ideas
            .values()
            .filter(|i| i.group_id == group_id)
            .map(|i| i.id)
            .collect();
        tables.ideas.retain(|id, _| !doomed.contains(id));
        for idea in tables.ideas.values_mut() {
            if idea.parent_id.map_or(false, |p| doomed.contains(&p)) {
                idea.parent_id = None;
            }
        }
        tables
            .links
            .retain(|_, l| !doomed.contains(&l.idea_id_a) && !doomed.contains(&l.idea_id_b));
        tables
            .link_index
            .retain(|(a, b, _)| !doomed.contains(a) && !doomed.contains(b));

        for group in tables.groups.values_mut() {
            if group.parent_group_id == Some(group_id) {
                group.parent_group_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for InMemoryTalkStorage {
    async fn add_membership(&self, membership: Membership) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&membership.group_id) {
            return Err(StorageError::NotFound(format!(
                "group {} not found",
                membership.group_id
            )));
        }
        let key = (membership.group_id, membership.user_id);
        if tables.members.contains_key(&key) {
            return Err(StorageError::Conflict(format!(
                "user {} is already a member of group {}",
                membership.user_id, membership.group_id
            )));
        }
        tables.members.insert(key, membership);
        Ok(())
    }

    async fn get_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> StorageResult<Option<Membership>> {
        let tables = self.tables.read().await;
        Ok(tables.members.get(&(group_id, user_id)).cloned())
    }

    async fn list_members(&self, group_id: GroupId) -> StorageResult<Vec<Membership>> {
        let tables = self.tables.read().await;
        let mut members: Vec<Membership> = tables
            .members
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn list_user_memberships(&self, user_id: UserId) -> StorageResult<Vec<Membership>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_members(&self, group_id: GroupId) -> StorageResult<usize> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .keys()
            .filter(|(g, _)| *g == group_id)
            .count())
    }

    async fn set_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role: Role,
    ) -> StorageResult<Membership> {
        let mut tables = self.tables.write().await;
        let current = tables
            .members
            .get(&(group_id, user_id))
            .map(|m| m.role)
            .ok_or_else(|| {
                StorageError::NotFound(format!(
                    "user {} is not a member of group {}",
                    user_id, group_id
                ))
            })?;

        if current.is_facilitator() && !role.is_facilitator() && tables.facilitator_count(group_id) <= 1
        {
            return Err(StorageError::InvariantViolation(format!(
                "group {} must keep at least one facilitator",
                group_id
            )));
        }

        let membership = tables
            .members
            .get_mut(&(group_id, user_id))
            .ok_or_else(|| StorageError::Backend("membership vanished under lock".into()))?;
        membership.role = role;
        Ok(membership.clone())
    }

    async fn remove_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> StorageResult<Membership> {
        let mut tables = self.tables.write().await;
        let current = tables.members.get(&(group_id, user_id)).ok_or_else(|| {
            StorageError::NotFound(format!(
                "user {} is not a member of group {}",
                user_id, group_id
            ))
        })?;

        if current.role.is_facilitator() && tables.facilitator_count(group_id) <= 1 {
            return Err(StorageError::InvariantViolation(format!(
                "the last facilitator cannot leave group {}",
                group_id
            )));
        }

        tables
            .members
            .remove(&(group_id, user_id))
            .ok_or_else(|| StorageError::Backend("membership vanished under lock".into()))
    }
}

#[async_trait]
impl IdeaStore for InMemoryTalkStorage {
    async fn insert_idea(&self, idea: NewIdea, created_at: DateTime<Utc>) -> StorageResult<Idea> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&idea.group_id) {
            return Err(StorageError::NotFound(format!(
                "group {} not found",
                idea.group_id
            )));
        }
        if let Some(parent) = idea.parent_id {
            if !tables.ideas.contains_key(&parent) {
                return Err(StorageError::NotFound(format!(
                    "parent idea {} not found",
                    parent
                )));
            }
        }

        tables.next_idea += 1;
        let record = Idea {
            id: IdeaId::new(tables.next_idea),
            group_id: idea.group_id,
            author_id: idea.author_id,
            parent_id: idea.parent_id,
            content: idea.content,
            category: idea.category,
            source: idea.source,
            status: IdeaStatus::Raw,
            shareable: false,
            edit_count: 0,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };
        tables.ideas.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_idea(&self, idea_id: IdeaId) -> StorageResult<Option<Idea>> {
        let tables = self.tables.read().await;
        Ok(tables.ideas.get(&idea_id).cloned())
    }

    async fn list_ideas(
        &self,
        filter: &IdeaFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<Idea>> {
        let tables = self.tables.read().await;
        let values = tables
            .ideas
            .values()
            .rev()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect::<Vec<_>>();
        Ok(apply_window(values, window))
    }

    async fn edit_idea(
        &self,
        idea_id: IdeaId,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Idea> {
        let mut tables = self.tables.write().await;
        let idea = tables.live_idea_mut(idea_id)?;
        idea.content = content.to_string();
        idea.edit_count += 1;
        idea.updated_at = updated_at;
        Ok(idea.clone())
    }

    async fn soft_delete_idea(
        &self,
        idea_id: IdeaId,
        deleted_at: DateTime<Utc>,
    ) -> StorageResult<Idea> {
        let mut tables = self.tables.write().await;
        let idea = tables.live_idea_mut(idea_id)?;
        idea.deleted_at = Some(deleted_at);
        idea.updated_at = deleted_at;
        Ok(idea.clone())
    }

    async fn transition_status(
        &self,
        idea_id: IdeaId,
        expected_from: IdeaStatus,
        to: IdeaStatus,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Idea> {
        let mut tables = self.tables.write().await;
        let idea = tables.live_idea_mut(idea_id)?;
        if idea.status != expected_from {
            return Err(StorageError::InvariantViolation(format!(
                "invalid status transition: expected {}, found {}",
                expected_from, idea.status
            )));
        }
        idea.status = to;
        idea.updated_at = updated_at;
        Ok(idea.clone())
    }

    async fn set_shareable(
        &self,
        idea_id: IdeaId,
        shareable: bool,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Idea> {
        let mut tables = self.tables.write().await;
        let idea = tables.live_idea_mut(idea_id)?;
        idea.shareable = shareable;
        idea.updated_at = updated_at;
        Ok(idea.clone())
    }
}

#[async_trait]
impl LinkStore for InMemoryTalkStorage {
    async fn insert_link(
        &self,
        link: NewIdeaLink,
        created_at: DateTime<Utc>,
    ) -> StorageResult<IdeaLink> {
        if link.is_self_link() {
            return Err(StorageError::InvalidInput(
                "an idea cannot be linked to itself".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        for end in [link.idea_id_a, link.idea_id_b] {
            if !tables.is_live(end) {
                return Err(StorageError::NotFound(format!(
                    "idea {} not found",
                    end
                )));
            }
        }

        let key = (link.idea_id_a, link.idea_id_b, link.link_type.clone());
        if tables.link_index.contains(&key) {
            return Err(StorageError::Conflict(format!(
                "ideas {} and {} are already linked as `{}`",
                link.idea_id_a, link.idea_id_b, link.link_type
            )));
        }

        tables.next_link += 1;
        let record = IdeaLink {
            id: LinkId::new(tables.next_link),
            idea_id_a: link.idea_id_a,
            idea_id_b: link.idea_id_b,
            link_type: link.link_type,
            created_by: link.created_by,
            created_at,
        };
        tables.link_index.insert(key);
        tables.links.insert(record.id, record.clone());
        Ok(record)
    }

    async fn links_for_idea(&self, idea_id: IdeaId) -> StorageResult<Vec<IdeaLink>> {
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .values()
            .filter(|l| l.touches(idea_id))
            .cloned()
            .collect())
    }

    async fn count_links(&self, idea_id: IdeaId) -> StorageResult<usize> {
        let tables = self.tables.read().await;
        Ok(tables.links.values().filter(|l| l.touches(idea_id)).count())
    }
}

fn apply_window<T>(values: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = values.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}
