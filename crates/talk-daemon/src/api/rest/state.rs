//! Application state for API handlers

use crate::identity::{IdentityResolver, TrustedHeaderResolver};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use talk_core::TalkService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub talk: Arc<TalkService>,

    /// Turns request headers into the acting user
    pub identity: Arc<dyn IdentityResolver>,

    pub version: String,

    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(talk: Arc<TalkService>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self {
            talk,
            identity,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// In-memory state reading the user id from `x-talk-user-id`.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(TalkService::in_memory()),
            Arc::new(TrustedHeaderResolver::new(
                axum::http::HeaderName::from_static("x-talk-user-id"),
            )),
        )
    }

    /// Human-readable uptime
    pub fn uptime(&self) -> String {
        let secs = (Utc::now() - self.started_at).num_seconds().max(0);
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
