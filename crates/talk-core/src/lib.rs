//! Talk Core
//!
//! The deliberation engine behind Talk: groups of users author, link and
//! mature short ideas under facilitator/member/observer roles.
//!
//! # Architecture
//!
//! [`TalkService`] composes one manager per concern over a shared
//! [`talk_storage::TalkStorage`]:
//!
//! - [`GroupManager`]: group CRUD and the membership lifecycle
//! - [`IdeaEngine`]: idea creation, edit, soft delete, promotion, sharing
//! - [`LinkGraph`]: typed, order-independent links between ideas
//! - [`Projections`]: read views (group detail, group listing, history)
//!
//! Every mutation takes the acting [`talk_types::Actor`] explicitly, loads
//! the target state, asks the pure [`gate`] for a verdict and then applies
//! one atomic storage operation.
//!
//! # Key Invariants
//!
//! 1. A group never has zero facilitators
//! 2. At most one membership per (group, user)
//! 3. Soft-deleted ideas reject every further write, including delete
//! 4. At most one link per unordered idea pair and link type
//!
//! # Example
//!
//! ```rust
//! use talk_core::{GroupDraft, IdeaDraft, TalkService};
//! use talk_types::Actor;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let talk = TalkService::in_memory();
//! let group = talk
//!     .groups()
//!     .create_group(Actor::user(1), GroupDraft::new("Transit"))
//!     .await
//!     .unwrap();
//! let idea = talk
//!     .ideas()
//!     .save(Actor::user(1), IdeaDraft::new(group.id, "Night buses"))
//!     .await
//!     .unwrap();
//! assert_eq!(idea.group_id, group.id);
//! # });
//! ```

#![deny(unsafe_code)]

mod error;
pub mod gate;
pub mod groups;
pub mod ideas;
pub mod links;
mod lookup;
pub mod query;
mod service;

pub use error::{TalkError, TalkResult};
pub use gate::{Action, Capabilities, GateDecision};
pub use groups::{GroupDraft, GroupManager};
pub use ideas::{IdeaDraft, IdeaEngine};
pub use links::LinkGraph;
pub use query::{GroupDetail, GroupSummary, HistoryQuery, IdeaView, Projections};
pub use service::TalkService;
