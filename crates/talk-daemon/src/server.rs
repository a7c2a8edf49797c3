//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{StorageConfig, TalkConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::identity::TrustedHeaderResolver;
use std::sync::Arc;
use talk_core::TalkService;
use talk_storage::{InMemoryTalkStorage, TalkStorage};
use tokio::net::TcpListener;

/// Talk daemon server
pub struct Server {
    config: TalkConfig,
    state: AppState,
}

impl Server {
    /// Open storage and wire the service for the given configuration
    pub async fn new(config: TalkConfig) -> DaemonResult<Self> {
        let store = open_storage(&config.storage).await?;
        let identity = TrustedHeaderResolver::from_name(&config.identity.header).map_err(|e| {
            DaemonError::Config(format!(
                "invalid identity header `{}`: {e}",
                config.identity.header
            ))
        })?;

        let state = AppState::new(Arc::new(TalkService::new(store)), Arc::new(identity));
        Ok(Self { config, state })
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(self.state, &self.config.server);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Talk daemon listening on {}", addr);
        tracing::info!(
            identity_header = %self.config.identity.header,
            "Acting user taken from trusted header"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Talk daemon shutting down");
        Ok(())
    }
}

async fn open_storage(config: &StorageConfig) -> DaemonResult<Arc<dyn TalkStorage>> {
    match config {
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; state is lost on restart");
            Ok(Arc::new(InMemoryTalkStorage::new()))
        }
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let store = talk_storage::postgres::PostgresTalkStorage::connect_with_options(
                url,
                *max_connections,
                *connect_timeout_secs,
            )
            .await?;
            tracing::info!(max_connections = *max_connections, "Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => Err(DaemonError::Config(
            "postgres storage requires the `postgres` feature".into(),
        )),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
