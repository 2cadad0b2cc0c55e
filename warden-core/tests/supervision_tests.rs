//! Integration tests for fleet supervision
//!
//! These exercise the registry and supervised agents together: mixed-outcome
//! fleet starts, health propagation into snapshots, and shutdown isolation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use warden_core::prelude::*;

/// Hooks with scriptable outcomes, shared by the scenarios below
#[derive(Default)]
struct ScriptedHooks {
    fail_start: bool,
    fail_stop: bool,
    check_error: Option<String>,
}

#[async_trait]
impl AgentHooks for ScriptedHooks {
    async fn on_start(&self) -> Result<()> {
        if self.fail_start {
            return Err("refused to start".into());
        }
        Ok(())
    }

    async fn on_stop(&self) -> Result<()> {
        if self.fail_stop {
            return Err("refused to stop".into());
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthCheck> {
        match &self.check_error {
            Some(msg) => Err(msg.clone().into()),
            None => Ok(HealthCheck::healthy()),
        }
    }
}

fn build_agent(id: &str, interval: Duration, hooks: ScriptedHooks) -> SupervisedAgent {
    let config = AgentConfig::builder(id, format!("Agent {}", id), "1.0.0")
        .health_check_interval(interval)
        .build()
        .expect("valid config");
    SupervisedAgent::new(config, Arc::new(hooks)).expect("valid agent")
}

#[tokio::test(start_paused = true)]
async fn mixed_fleet_start_reports_both_outcomes() {
    let registry = AgentRegistry::new();
    registry
        .register(build_agent(
            "good",
            Duration::from_secs(3600),
            ScriptedHooks::default(),
        ))
        .await
        .expect("register");
    registry
        .register(build_agent(
            "bad",
            Duration::from_secs(3600),
            ScriptedHooks {
                fail_start: true,
                ..Default::default()
            },
        ))
        .await
        .expect("register");

    let report = registry.start_all().await;

    assert_eq!(report.succeeded, vec!["good".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "bad");
    assert!(matches!(
        report.failed[0].1,
        WardenError::StartupFailure { .. }
    ));

    let infos = registry.get_all().await;
    let good = infos.iter().find(|info| info.id == "good").expect("good");
    let bad = infos.iter().find(|info| info.id == "bad").expect("bad");
    assert_eq!(good.state, AgentState::Running);
    assert_eq!(bad.state, AgentState::Error);
}

#[tokio::test(start_paused = true)]
async fn health_status_propagates_into_snapshots() {
    let registry = AgentRegistry::new();
    registry
        .register(build_agent(
            "a",
            Duration::from_millis(50),
            ScriptedHooks::default(),
        ))
        .await
        .expect("register");
    registry
        .register(build_agent(
            "b",
            Duration::from_millis(50),
            ScriptedHooks {
                check_error: Some("down".to_string()),
                ..Default::default()
            },
        ))
        .await
        .expect("register");

    let report = registry.start_all().await;
    assert!(report.all_succeeded());

    // Let the initial health-check cycle complete.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let infos = registry.get_all().await;
    let a = infos.iter().find(|info| info.id == "a").expect("a");
    let b = infos.iter().find(|info| info.id == "b").expect("b");

    assert_eq!(a.health.status, HealthStatus::Healthy);
    assert_eq!(b.health.status, HealthStatus::Unhealthy);
    assert_eq!(b.health.message.as_deref(), Some("down"));

    registry.stop_all().await;
}

#[tokio::test(start_paused = true)]
async fn stubborn_agent_does_not_block_fleet_shutdown() {
    let registry = AgentRegistry::new();
    registry
        .register(build_agent(
            "polite",
            Duration::from_secs(3600),
            ScriptedHooks::default(),
        ))
        .await
        .expect("register");
    registry
        .register(build_agent(
            "stubborn",
            Duration::from_secs(3600),
            ScriptedHooks {
                fail_stop: true,
                ..Default::default()
            },
        ))
        .await
        .expect("register");

    assert!(registry.start_all().await.all_succeeded());

    let report = registry.stop_all().await;
    assert_eq!(report.succeeded, vec!["polite".to_string()]);
    assert_eq!(report.failed.len(), 1);

    let polite = registry.get("polite").await.expect("agent");
    let stubborn = registry.get("stubborn").await.expect("agent");
    assert_eq!(polite.state().await, AgentState::Stopped);
    assert_eq!(stubborn.state().await, AgentState::Error);
}

#[tokio::test]
async fn unregistered_agent_is_gone() {
    let registry = AgentRegistry::new();
    let agent = build_agent("a", Duration::from_secs(3600), ScriptedHooks::default());
    registry.register(agent).await.expect("register");

    registry.unregister("a").await.expect("unregister");
    assert!(registry.get("a").await.is_none());
    assert!(registry.get_all().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn snapshot_reflects_uptime_and_start_timestamp() {
    let registry = AgentRegistry::new();
    registry
        .register(build_agent(
            "a",
            Duration::from_secs(3600),
            ScriptedHooks::default(),
        ))
        .await
        .expect("register");

    let before = registry.get_all().await;
    assert!(before[0].started_at.is_none());
    assert_eq!(before[0].metadata.uptime_ms, 0);

    registry.start_all().await;

    let after = registry.get_all().await;
    assert!(after[0].started_at.is_some());
    assert_eq!(after[0].metadata.version, "1.0.0");
}
