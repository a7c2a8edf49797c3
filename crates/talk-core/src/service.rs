use crate::groups::GroupManager;
use crate::ideas::IdeaEngine;
use crate::links::LinkGraph;
use crate::query::Projections;
use std::sync::Arc;
use talk_storage::{InMemoryTalkStorage, TalkStorage};

/// Entry point composing the managers over one shared store.
///
/// Managers hold no state of their own besides the store handle, so a
/// `TalkService` is cheap to share across request handlers behind an `Arc`.
pub struct TalkService {
    groups: GroupManager,
    ideas: IdeaEngine,
    links: LinkGraph,
    views: Projections,
}

impl TalkService {
    pub fn new(store: Arc<dyn TalkStorage>) -> Self {
        Self {
            groups: GroupManager::new(store.clone()),
            ideas: IdeaEngine::new(store.clone()),
            links: LinkGraph::new(store.clone()),
            views: Projections::new(store),
        }
    }

    /// Service over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTalkStorage::new()))
    }

    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    pub fn ideas(&self) -> &IdeaEngine {
        &self.ideas
    }

    pub fn links(&self) -> &LinkGraph {
        &self.links
    }

    pub fn views(&self) -> &Projections {
        &self.views
    }
}
