//! Talk Domain Types
//!
//! This crate defines the domain types for Talk, a permissioned deliberation
//! engine where groups of citizens author, link and mature short ideas.
//!
//! # Key Concepts
//!
//! - **Group**: a bounded circle of users with an access level that controls
//!   self-service joining.
//! - **Membership**: the (group, user) pair carrying a facilitator, member or
//!   observer role. At most one per pair.
//! - **Idea**: an atomic contribution owned by its author, maturing through
//!   `raw → refining → distilled → actionable`. Ideas are soft-deleted.
//! - **IdeaLink**: a typed, symmetric relation between two distinct ideas,
//!   stored with a canonical (low, high) ordering.
//!
//! # Architecture
//!
//! This is a pure types crate with no runtime dependencies. All types
//! implement `Clone`, `Debug`, `Serialize`, `Deserialize`. IDs use the
//! newtype pattern over integer identities and implement `Display`.

#![deny(unsafe_code)]

mod actor;
mod errors;
mod group;
mod ids;
mod idea;
mod link;
mod membership;

pub use actor::*;
pub use errors::*;
pub use group::*;
pub use ids::*;
pub use idea::*;
pub use link::*;
pub use membership::*;
