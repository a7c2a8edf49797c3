//! Talk storage abstractions.
//!
//! This crate defines the storage contract the Talk core relies on:
//! - groups, created together with their first facilitator membership
//! - memberships, unique per (group, user), never leaving a group without a
//!   facilitator
//! - ideas, soft-deleted and mutated only while live
//! - idea links, stored in canonical order and unique per (pair, type)
//!
//! Design stance:
//! - every compound check-then-write is a single atomic operation of the
//!   adapter, so two concurrent requests cannot both pass the check
//! - PostgreSQL is the transactional source of truth in production; the
//!   in-memory adapter is the deterministic reference used in tests

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryTalkStorage;
pub use traits::{
    GroupStore, IdeaFilter, IdeaStore, LinkStore, MembershipStore, QueryWindow, TalkStorage,
};
