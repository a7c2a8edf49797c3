//! Query/Projection Layer: read-only composed views.
//!
//! Reads skip the gate but still filter by visibility: closed groups are
//! listed only to their members, and non-members see shareable ideas only.

use crate::error::TalkResult;
use crate::lookup::{load_group, require_user, role_of};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use talk_storage::{IdeaFilter, QueryWindow, TalkStorage};
use talk_types::{Actor, Group, GroupId, Idea, IdeaCategory, Membership, Role};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const MAX_HISTORY_LIMIT: usize = 200;

/// A group with its headcount and the caller's role in it.
#[derive(Clone, Debug, Serialize)]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: Group,
    pub member_count: usize,
    pub user_role: Option<Role>,
}

/// An idea with the number of links touching it.
#[derive(Clone, Debug, Serialize)]
pub struct IdeaView {
    #[serde(flatten)]
    pub idea: Idea,
    pub link_count: usize,
}

/// Full group page: summary, roster, shareable idea feed and sub-groups.
#[derive(Clone, Debug, Serialize)]
pub struct GroupDetail {
    pub group: GroupSummary,
    pub members: Vec<Membership>,
    pub ideas: Vec<IdeaView>,
    pub sub_groups: Vec<GroupSummary>,
    pub user_role: Option<Role>,
}

#[derive(Clone, Debug, Default)]
pub struct HistoryQuery {
    pub group_id: Option<GroupId>,
    pub limit: Option<usize>,
    pub category: Option<IdeaCategory>,
}

impl HistoryQuery {
    pub fn for_group(group_id: GroupId) -> Self {
        Self {
            group_id: Some(group_id),
            ..Default::default()
        }
    }

    fn window(&self) -> QueryWindow {
        let limit = match self.limit {
            None | Some(0) => DEFAULT_HISTORY_LIMIT,
            Some(n) => n.min(MAX_HISTORY_LIMIT),
        };
        QueryWindow::first(limit)
    }
}

pub struct Projections {
    store: Arc<dyn TalkStorage>,
}

impl Projections {
    pub fn new(store: Arc<dyn TalkStorage>) -> Self {
        Self { store }
    }

    pub async fn get_group(&self, actor: Actor, group_id: GroupId) -> TalkResult<GroupDetail> {
        let group = load_group(self.store.as_ref(), group_id).await?;
        let user_role = role_of(self.store.as_ref(), group.id, actor).await?;

        let members = self.store.list_members(group.id).await?;
        let ideas = self
            .store
            .list_ideas(
                &IdeaFilter::in_group(group.id).shareable_only(),
                QueryWindow::default(),
            )
            .await?;
        let ideas = self.with_link_counts(ideas).await?;

        let mut sub_groups = Vec::new();
        for child in self.store.list_sub_groups(group.id).await? {
            sub_groups.push(self.summarize(child, actor).await?);
        }

        Ok(GroupDetail {
            group: GroupSummary {
                member_count: members.len(),
                user_role,
                group,
            },
            members,
            ideas,
            sub_groups,
            user_role,
        })
    }

    /// All visible groups, or with `mine` only those the actor belongs to.
    pub async fn list_groups(&self, actor: Actor, mine: bool) -> TalkResult<Vec<GroupSummary>> {
        let member_of: BTreeSet<GroupId> = match actor.user_id() {
            Some(user) => self
                .store
                .list_user_memberships(user)
                .await?
                .into_iter()
                .map(|m| m.group_id)
                .collect(),
            None if mine => {
                require_user(actor)?;
                BTreeSet::new()
            }
            None => BTreeSet::new(),
        };

        let mut summaries = Vec::new();
        for group in self.store.list_groups().await? {
            let visible = if mine {
                member_of.contains(&group.id)
            } else {
                group.access_level.is_open() || member_of.contains(&group.id)
            };
            if visible {
                summaries.push(self.summarize(group, actor).await?);
            }
        }
        Ok(summaries)
    }

    /// Recent ideas, newest first.
    ///
    /// Scoped to a group, members see every live idea and everyone else the
    /// shareable ones. Unscoped, it lists the actor's own ideas.
    pub async fn history(&self, actor: Actor, query: HistoryQuery) -> TalkResult<Vec<IdeaView>> {
        let filter = match query.group_id {
            Some(group_id) => {
                let group = load_group(self.store.as_ref(), group_id).await?;
                let filter = IdeaFilter::in_group(group.id);
                match role_of(self.store.as_ref(), group.id, actor).await? {
                    Some(_) => filter,
                    None => filter.shareable_only(),
                }
            }
            None => IdeaFilter::by_author(require_user(actor)?),
        }
        .with_category(query.category);

        let ideas = self.store.list_ideas(&filter, query.window()).await?;
        self.with_link_counts(ideas).await
    }

    async fn summarize(&self, group: Group, actor: Actor) -> TalkResult<GroupSummary> {
        let member_count = self.store.count_members(group.id).await?;
        let user_role = role_of(self.store.as_ref(), group.id, actor).await?;
        Ok(GroupSummary {
            group,
            member_count,
            user_role,
        })
    }

    async fn with_link_counts(&self, ideas: Vec<Idea>) -> TalkResult<Vec<IdeaView>> {
        let mut views = Vec::with_capacity(ideas.len());
        for idea in ideas {
            let link_count = self.store.count_links(idea.id).await?;
            views.push(IdeaView { idea, link_count });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TalkError;
    use crate::groups::{GroupDraft, GroupManager};
    use crate::ideas::{IdeaDraft, IdeaEngine};
    use talk_storage::InMemoryTalkStorage;

    struct World {
        groups: GroupManager,
        ideas: IdeaEngine,
        views: Projections,
    }

    fn world() -> World {
        let store: Arc<dyn TalkStorage> = Arc::new(InMemoryTalkStorage::new());
        World {
            groups: GroupManager::new(store.clone()),
            ideas: IdeaEngine::new(store.clone()),
            views: Projections::new(store),
        }
    }

    #[tokio::test]
    async fn list_groups_hides_foreign_closed_groups() {
        let w = world();
        let open = w
            .groups
            .create_group(Actor::user(1), GroupDraft::new("Open"))
            .await
            .unwrap();
        let closed = w
            .groups
            .create_group(Actor::user(1), GroupDraft::new("Closed").closed())
            .await
            .unwrap();

        let as_stranger = w.views.list_groups(Actor::user(2), false).await.unwrap();
        assert_eq!(as_stranger.len(), 1);
        assert_eq!(as_stranger[0].group.id, open.id);
        assert_eq!(as_stranger[0].user_role, None);

        let as_owner = w.views.list_groups(Actor::user(1), false).await.unwrap();
        assert_eq!(as_owner.len(), 2);
        assert_eq!(as_owner[0].group.id, closed.id);
        assert_eq!(as_owner[0].user_role, Some(Role::Facilitator));

        let mine = w.views.list_groups(Actor::user(2), true).await.unwrap();
        assert!(mine.is_empty());
        assert!(matches!(
            w.views.list_groups(Actor::Anonymous, true).await,
            Err(TalkError::Authentication(_))
        ));
        assert_eq!(w.views.list_groups(Actor::Anonymous, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn group_detail_shows_shareable_feed() {
        let w = world();
        let group = w
            .groups
            .create_group(Actor::user(1), GroupDraft::new("Housing"))
            .await
            .unwrap();
        w.groups.join_group(Actor::user(2), group.id).await.unwrap();
        let private = w
            .ideas
            .save(Actor::user(2), IdeaDraft::new(group.id, "Draft"))
            .await
            .unwrap();
        let public = w
            .ideas
            .save(Actor::user(2), IdeaDraft::new(group.id, "Share me"))
            .await
            .unwrap();
        w.ideas
            .toggle_shareable(Actor::user(2), public.id, Some(true))
            .await
            .unwrap();

        let detail = w.views.get_group(Actor::Anonymous, group.id).await.unwrap();
        assert_eq!(detail.group.member_count, 2);
        assert_eq!(detail.members.len(), 2);
        assert_eq!(detail.user_role, None);
        assert_eq!(detail.ideas.len(), 1);
        assert_eq!(detail.ideas[0].idea.id, public.id);
        assert_ne!(detail.ideas[0].idea.id, private.id);

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["group"]["name"], "Housing");
        assert_eq!(json["group"]["member_count"], 2);
        assert_eq!(json["ideas"][0]["link_count"], 0);
    }

    #[tokio::test]
    async fn history_visibility_and_limits() {
        let w = world();
        let group = w
            .groups
            .create_group(Actor::user(1), GroupDraft::new("Budget"))
            .await
            .unwrap();
        for n in 0..3 {
            w.ideas
                .save(
                    Actor::user(1),
                    IdeaDraft::new(group.id, format!("line {n}"))
                        .with_category(IdeaCategory::Todo),
                )
                .await
                .unwrap();
        }
        let shared = w
            .ideas
            .save(Actor::user(1), IdeaDraft::new(group.id, "shared"))
            .await
            .unwrap();
        w.ideas
            .toggle_shareable(Actor::user(1), shared.id, Some(true))
            .await
            .unwrap();

        let member_view = w
            .views
            .history(Actor::user(1), HistoryQuery::for_group(group.id))
            .await
            .unwrap();
        assert_eq!(member_view.len(), 4);
        assert_eq!(member_view[0].idea.id, shared.id);

        let outsider_view = w
            .views
            .history(Actor::user(9), HistoryQuery::for_group(group.id))
            .await
            .unwrap();
        assert_eq!(outsider_view.len(), 1);

        let todos = w
            .views
            .history(
                Actor::user(1),
                HistoryQuery {
                    category: Some(IdeaCategory::Todo),
                    limit: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(todos.len(), 2);
        assert!(todos.iter().all(|v| v.idea.category == IdeaCategory::Todo));

        assert!(matches!(
            w.views.history(Actor::Anonymous, HistoryQuery::default()).await,
            Err(TalkError::Authentication(_))
        ));
    }

    #[test]
    fn history_window_is_capped() {
        let q = HistoryQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(q.window().limit, MAX_HISTORY_LIMIT);
        assert_eq!(HistoryQuery::default().window().limit, DEFAULT_HISTORY_LIMIT);
    }
}
