//! Warden server - HTTP host for the agent supervision runtime
//!
//! Loads the fleet configuration, constructs and registers one supervised
//! agent per entry, starts the fleet, and serves the health/readiness/agents
//! endpoints until shutdown.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use warden_core::prelude::*;

mod heartbeat;
mod routes;

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Agent supervision server", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the fleet configuration file
    #[arg(short, long, env = "WARDEN_CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => WardenConfig::from_file(path)?,
        None => WardenConfig::load()?,
    };

    let registry = Arc::new(AgentRegistry::new());
    for agent_config in &config.agents {
        let agent = SupervisedAgent::new(
            agent_config.clone(),
            Arc::new(heartbeat::HeartbeatAgent::new()),
        )?;
        registry.register(agent).await?;
    }
    info!(agents = registry.len().await, "Fleet registered");

    let report = registry.start_all().await;
    for (id, err) in &report.failed {
        error!(agent_id = %id, error = %err, "Agent failed to start");
    }
    info!(
        started = report.succeeded.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "Fleet startup complete"
    );

    let app = routes::router(registry.clone());
    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    info!(listen = %config.server.listen, "HTTP surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down; stopping all agents");
    let report = registry.stop_all().await;
    for (id, err) in &report.failed {
        error!(agent_id = %id, error = %err, "Agent failed to stop");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
