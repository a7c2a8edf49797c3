//! Talk daemon library
//!
//! This module provides the components behind `talkd`:
//! - the single action-dispatch HTTP endpoint
//! - the identity resolution seam
//! - configuration loading
//! - server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod server;

pub use config::TalkConfig;
pub use error::{ApiError, DaemonError};
pub use identity::{IdentityResolver, TrustedHeaderResolver};
pub use server::Server;
