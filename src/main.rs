//! hotseat: a two-tier trivia game server
//!
//! Two independently-addressable TCP tiers:
//! - Game host: per-player quiz sessions over raw TCP
//! - Lifeline service: audience-poll and 50:50 hints on request
//!
//! Features:
//! - Per-connection session state machine with scoring and lifelines
//! - Dash- and colon-delimited text protocols with newline framing
//! - Local fallback hints when the lifeline tier is unreachable
//! - Configuration via CLI arguments or TOML file

mod config;
mod lifeline;
mod lifeline_client;
mod protocols;
mod questions;
mod registry;
mod server_game;
mod server_lifeline;
mod session;

use config::{Config, Tier};
use lifeline_client::LifelineClient;
use server_game::GameServer;
use server_lifeline::LifelineServer;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        tier = ?config.tier,
        listen = %config.listen,
        "Starting hotseat"
    );

    // Ctrl-C flips the shutdown channel both tiers select on.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    match config.tier {
        Tier::GameHost => {
            info!(lifeline_addr = %config.lifeline_addr, "Using lifeline service");
            let lifeline = Arc::new(LifelineClient::new(config.lifeline_addr.clone()));
            let server = GameServer::bind(&config.listen, lifeline).await?;
            server.run(shutdown_rx).await?;
        }
        Tier::LifelineService => {
            let server = LifelineServer::bind(&config.listen).await?;
            server.run(shutdown_rx).await?;
        }
    }

    Ok(())
}
