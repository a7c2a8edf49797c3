use crate::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use talk_types::{
    Group, GroupId, GroupPatch, Idea, IdeaCategory, IdeaId, IdeaLink, IdeaStatus, Membership,
    NewGroup, NewIdea, NewIdeaLink, Role, UserId,
};

/// Generic query window for paged reads. A `limit` of zero means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

impl QueryWindow {
    pub fn first(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }
}

/// Selection of ideas for listing reads.
#[derive(Debug, Clone, Default)]
pub struct IdeaFilter {
    pub group_id: Option<GroupId>,
    pub author_id: Option<UserId>,
    pub category: Option<IdeaCategory>,
    pub shareable_only: bool,
    pub include_deleted: bool,
}

impl IdeaFilter {
    pub fn in_group(group_id: GroupId) -> Self {
        Self {
            group_id: Some(group_id),
            ..Default::default()
        }
    }

    pub fn by_author(author_id: UserId) -> Self {
        Self {
            author_id: Some(author_id),
            ..Default::default()
        }
    }

    pub fn shareable_only(mut self) -> Self {
        self.shareable_only = true;
        self
    }

    pub fn with_category(mut self, category: Option<IdeaCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn matches(&self, idea: &Idea) -> bool {
        self.group_id.map_or(true, |g| idea.group_id == g)
            && self.author_id.map_or(true, |a| idea.author_id == a)
            && self.category.map_or(true, |c| idea.category == c)
            && (!self.shareable_only || idea.shareable)
            && (self.include_deleted || !idea.is_deleted())
    }
}

/// Storage interface for groups.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Insert a group and its creator's facilitator membership atomically.
    async fn create_group(
        &self,
        group: NewGroup,
        created_at: DateTime<Utc>,
    ) -> StorageResult<(Group, Membership)>;

    async fn get_group(&self, group_id: GroupId) -> StorageResult<Option<Group>>;

    /// List groups newest-first.
    async fn list_groups(&self) -> StorageResult<Vec<Group>>;

    async fn list_sub_groups(&self, parent: GroupId) -> StorageResult<Vec<Group>>;

    async fn update_group(
        &self,
        group_id: GroupId,
        patch: &GroupPatch,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Group>;

    /// Remove a group with its memberships, ideas and links. Sub-groups are
    /// detached, not removed.
    async fn delete_group(&self, group_id: GroupId) -> StorageResult<()>;
}

/// Storage interface for memberships.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a membership. `Conflict` when the pair already exists.
    async fn add_membership(&self, membership: Membership) -> StorageResult<()>;

    async fn get_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> StorageResult<Option<Membership>>;

    /// Members in join order.
    async fn list_members(&self, group_id: GroupId) -> StorageResult<Vec<Membership>>;

    async fn list_user_memberships(&self, user_id: UserId) -> StorageResult<Vec<Membership>>;

    async fn count_members(&self, group_id: GroupId) -> StorageResult<usize>;

    /// Reassign a role. `InvariantViolation` when it would demote the last
    /// facilitator.
    async fn set_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role: Role,
    ) -> StorageResult<Membership>;

    /// Remove a membership. `InvariantViolation` when it is the last
    /// facilitator.
    async fn remove_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> StorageResult<Membership>;
}

/// Storage interface for ideas.
#[async_trait]
pub trait IdeaStore: Send + Sync {
    async fn insert_idea(&self, idea: NewIdea, created_at: DateTime<Utc>) -> StorageResult<Idea>;

    /// Get one idea, soft-deleted included.
    async fn get_idea(&self, idea_id: IdeaId) -> StorageResult<Option<Idea>>;

    /// List ideas newest-first.
    async fn list_ideas(&self, filter: &IdeaFilter, window: QueryWindow)
        -> StorageResult<Vec<Idea>>;

    /// Replace content of a live idea and bump its edit count.
    async fn edit_idea(
        &self,
        idea_id: IdeaId,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Idea>;

    /// Mark a live idea deleted. `NotFound` when already deleted.
    async fn soft_delete_idea(
        &self,
        idea_id: IdeaId,
        deleted_at: DateTime<Utc>,
    ) -> StorageResult<Idea>;

    /// Move a live idea from one status to another.
    async fn transition_status(
        &self,
        idea_id: IdeaId,
        expected_from: IdeaStatus,
        to: IdeaStatus,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Idea>;

    async fn set_shareable(
        &self,
        idea_id: IdeaId,
        shareable: bool,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Idea>;
}

/// Storage interface for idea links.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Insert a canonical link. `Conflict` when an equivalent link exists,
    /// `NotFound` when either idea is missing or deleted.
    async fn insert_link(
        &self,
        link: NewIdeaLink,
        created_at: DateTime<Utc>,
    ) -> StorageResult<IdeaLink>;

    /// Every link with `idea_id` at either end, oldest first.
    async fn links_for_idea(&self, idea_id: IdeaId) -> StorageResult<Vec<IdeaLink>>;

    async fn count_links(&self, idea_id: IdeaId) -> StorageResult<usize>;
}

/// Unified storage bundle used by the Talk core.
pub trait TalkStorage: GroupStore + MembershipStore + IdeaStore + LinkStore + Send + Sync {}

impl<T> TalkStorage for T where T: GroupStore + MembershipStore + IdeaStore + LinkStore + Send + Sync
{}
