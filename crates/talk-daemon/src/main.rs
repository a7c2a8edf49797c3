//! Talk Daemon - deliberation service
//!
//! `talkd` serves the Talk action-dispatch endpoint over HTTP:
//! - groups and memberships
//! - the idea lifecycle
//! - idea links and read projections

use anyhow::Context;
use clap::Parser;
use talk_daemon::{Server, TalkConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Talk Daemon CLI
#[derive(Parser)]
#[command(name = "talkd")]
#[command(about = "Talk Daemon - group deliberation service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TALK_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "TALK_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, env = "TALK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "TALK_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config =
        TalkConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .with_context(|| format!("invalid listen address `{listen}`"))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        "Starting talkd"
    );

    let server = Server::new(config).await?;
    server.run().await?;
    Ok(())
}
