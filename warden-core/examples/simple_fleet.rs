//! Simple fleet example demonstrating basic usage
//!
//! This example supervises two in-process agents: one healthy worker and one
//! whose health probe always fails, showing failure-isolated fleet startup
//! and health snapshots.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use warden_core::prelude::*;

/// A worker that starts cleanly and always probes healthy
struct Worker;

#[async_trait]
impl AgentHooks for Worker {
    async fn on_start(&self) -> Result<()> {
        Ok(())
    }

    async fn on_stop(&self) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthCheck> {
        Ok(HealthCheck::healthy())
    }
}

/// A worker whose backend is unreachable
struct FlakyWorker;

#[async_trait]
impl AgentHooks for FlakyWorker {
    async fn on_start(&self) -> Result<()> {
        Ok(())
    }

    async fn on_stop(&self) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthCheck> {
        Err("backend unreachable".into())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("🚀 Simple Fleet Example");
    println!("=======================\n");

    let registry = AgentRegistry::new();

    let steady = AgentConfig::builder("steady", "Steady Worker", "1.0.0")
        .health_check_interval(Duration::from_millis(200))
        .build()?;
    registry
        .register(SupervisedAgent::new(steady, Arc::new(Worker))?)
        .await?;

    let flaky = AgentConfig::builder("flaky", "Flaky Worker", "1.0.0")
        .health_check_interval(Duration::from_millis(200))
        .build()?;
    registry
        .register(SupervisedAgent::new(flaky, Arc::new(FlakyWorker))?)
        .await?;

    println!("Starting fleet...");
    let report = registry.start_all().await;
    println!(
        "✓ Started {} agent(s), {} failed\n",
        report.succeeded.len(),
        report.failed.len()
    );

    // Give the initial health-check cycle a moment to complete
    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("Fleet snapshot:");
    for info in registry.get_all().await {
        println!(
            "  • {} [{}] health={} {}",
            info.id,
            info.state,
            info.health.status,
            info.health.message.as_deref().unwrap_or("")
        );
    }

    println!("\nStopping fleet...");
    let report = registry.stop_all().await;
    println!("✓ Stopped {} agent(s)", report.succeeded.len());

    println!("\n✨ Fleet demonstration complete!");
    Ok(())
}
