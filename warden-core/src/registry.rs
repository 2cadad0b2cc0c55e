//! Agent registry
//!
//! An in-memory collection of supervised agents keyed by identifier, with
//! bulk lifecycle operations that isolate per-agent failures: one agent's
//! failed start or stop never aborts its siblings. A fleet of independent
//! agents gets partial availability, not all-or-nothing startup.

use crate::agent::{AgentInfo, SupervisedAgent};
use crate::error::{Result, WardenError};
use crate::events::{
    AgentEvent, AgentObserver, RegistryObserver, RegistryObserverSet, SubscriptionId,
};
use crate::health::HealthCheck;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Outcome of a bulk lifecycle operation, per agent identifier
#[derive(Debug, Default)]
pub struct FleetReport {
    /// Agents whose operation completed successfully
    pub succeeded: Vec<String>,

    /// Agents skipped because their config disables them
    pub skipped: Vec<String>,

    /// Agents whose operation failed, with the error
    pub failed: Vec<(String, WardenError)>,
}

impl FleetReport {
    /// True when no per-agent operation failed
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Re-emits a registered agent's events at registry level
struct EventForwarder {
    observers: Arc<RegistryObserverSet>,
}

#[async_trait]
impl AgentObserver for EventForwarder {
    async fn on_started(&self, event: &AgentEvent) -> Result<()> {
        self.observers.emit(event).await;
        Ok(())
    }

    async fn on_stopped(&self, event: &AgentEvent) -> Result<()> {
        self.observers.emit(event).await;
        Ok(())
    }

    async fn on_unhealthy(&self, event: &AgentEvent, _check: &HealthCheck) -> Result<()> {
        self.observers.emit(event).await;
        Ok(())
    }
}

struct RegisteredAgent {
    agent: SupervisedAgent,
    forwarder: SubscriptionId,
}

#[derive(Default)]
struct RegistryInner {
    agents: HashMap<String, RegisteredAgent>,
    /// Registration order, for deterministic iteration
    order: Vec<String>,
}

/// Supervises a population of agents as a unit
pub struct AgentRegistry {
    inner: RwLock<RegistryInner>,
    observers: Arc<RegistryObserverSet>,
}

impl AgentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            observers: Arc::new(RegistryObserverSet::new()),
        }
    }

    /// Register an agent.
    ///
    /// Installs a forwarding observer so the agent's `started` / `stopped` /
    /// `unhealthy` events are re-emitted as registry-level events carrying
    /// the original payload.
    ///
    /// # Errors
    ///
    /// `DuplicateAgent` if an agent with the same identifier is registered.
    pub async fn register(&self, agent: SupervisedAgent) -> Result<()> {
        let mut inner = self.inner.write().await;
        let id = agent.id().to_string();
        if inner.agents.contains_key(&id) {
            return Err(WardenError::DuplicateAgent(id));
        }

        let forwarder = agent
            .subscribe(Arc::new(EventForwarder {
                observers: self.observers.clone(),
            }))
            .await;

        debug!(agent_id = %id, name = %agent.name(), "Registered agent");
        inner.order.push(id.clone());
        inner.agents.insert(id, RegisteredAgent { agent, forwarder });
        Ok(())
    }

    /// Remove an agent from the registry and return it.
    ///
    /// Does not stop the agent; that remains the caller's responsibility.
    ///
    /// # Errors
    ///
    /// `UnknownAgent` if no agent with that identifier is registered.
    pub async fn unregister(&self, id: &str) -> Result<SupervisedAgent> {
        let entry = {
            let mut inner = self.inner.write().await;
            let Some(entry) = inner.agents.remove(id) else {
                return Err(WardenError::UnknownAgent(id.to_string()));
            };
            inner.order.retain(|existing| existing != id);
            entry
        };

        entry.agent.unsubscribe(entry.forwarder).await;
        debug!(agent_id = %id, "Unregistered agent");
        Ok(entry.agent)
    }

    /// Look up a registered agent by identifier
    pub async fn get(&self, id: &str) -> Option<SupervisedAgent> {
        self.inner
            .read()
            .await
            .agents
            .get(id)
            .map(|entry| entry.agent.clone())
    }

    /// Every registered agent, in registration order
    pub async fn agents(&self) -> Vec<SupervisedAgent> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.agents.get(id))
            .map(|entry| entry.agent.clone())
            .collect()
    }

    /// Snapshot every registered agent, in registration order
    pub async fn get_all(&self) -> Vec<AgentInfo> {
        let agents = self.agents().await;
        let mut infos = Vec::with_capacity(agents.len());
        for agent in agents {
            infos.push(agent.info().await);
        }
        infos
    }

    /// Number of registered agents
    pub async fn len(&self) -> usize {
        self.inner.read().await.agents.len()
    }

    /// True when no agents are registered
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.agents.is_empty()
    }

    /// Register a registry-level observer
    pub async fn subscribe(&self, observer: Arc<dyn RegistryObserver>) -> SubscriptionId {
        self.observers.subscribe(observer).await
    }

    /// Remove a previously registered registry-level observer
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id).await
    }

    /// Start every enabled registered agent, concurrently and independently.
    ///
    /// One agent's failure never prevents a sibling's start attempt; the
    /// call itself never fails. Disabled agents are skipped and reported.
    pub async fn start_all(&self) -> FleetReport {
        let agents = self.agents().await;
        info!(count = agents.len(), "Starting all registered agents");

        let mut report = FleetReport::default();
        let (enabled, disabled): (Vec<_>, Vec<_>) =
            agents.into_iter().partition(|agent| agent.is_enabled());

        for agent in disabled {
            debug!(agent_id = %agent.id(), "Agent disabled; skipping start");
            report.skipped.push(agent.id().to_string());
        }

        let outcomes = join_all(enabled.iter().map(|agent| async move {
            (agent.id().to_string(), agent.start().await)
        }))
        .await;

        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded.push(id),
                Err(e) => {
                    error!(agent_id = %id, error = %e, "Agent failed to start");
                    report.failed.push((id, e));
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Fleet start complete"
        );
        report
    }

    /// Stop every registered agent, concurrently and best-effort.
    ///
    /// Shutdown is unconditional: a hung or erroring agent never blocks
    /// releasing the others. Failures are logged and reported, never raised.
    pub async fn stop_all(&self) -> FleetReport {
        let agents = self.agents().await;
        info!(count = agents.len(), "Stopping all registered agents");

        let outcomes = join_all(agents.iter().map(|agent| async move {
            (agent.id().to_string(), agent.stop().await)
        }))
        .await;

        let mut report = FleetReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded.push(id),
                Err(e) => {
                    error!(agent_id = %id, error = %e, "Agent failed to stop");
                    report.failed.push((id, e));
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Fleet stop complete"
        );
        report
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentHooks, AgentState};
    use crate::config::AgentConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct TestHooks {
        fail_start: bool,
        fail_stop: bool,
        check_error: Option<String>,
    }

    #[async_trait]
    impl AgentHooks for TestHooks {
        async fn on_start(&self) -> Result<()> {
            if self.fail_start {
                return Err("start hook failed".into());
            }
            Ok(())
        }

        async fn on_stop(&self) -> Result<()> {
            if self.fail_stop {
                return Err("stop hook failed".into());
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

    fn agent(id: &str, hooks: TestHooks) -> SupervisedAgent {
        let config = AgentConfig::builder(id, format!("Agent {}", id), "1.0.0")
            .health_check_interval(Duration::from_secs(3600))
            .build()
            .expect("valid config");
        SupervisedAgent::new(config, Arc::new(hooks)).expect("valid agent")
    }

    fn disabled_agent(id: &str) -> SupervisedAgent {
        let config = AgentConfig::builder(id, format!("Agent {}", id), "1.0.0")
            .health_check_interval(Duration::from_secs(3600))
            .enabled(false)
            .build()
            .expect("valid config");
        SupervisedAgent::new(config, Arc::new(TestHooks::default())).expect("valid agent")
    }

    #[derive(Default)]
    struct RegistryRecorder {
        started: AtomicUsize,
        stopped: AtomicUsize,
        unhealthy: AtomicUsize,
    }

    #[async_trait]
    impl RegistryObserver for RegistryRecorder {
        async fn on_agent_started(&self, _event: &AgentEvent) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_agent_stopped(&self, _event: &AgentEvent) -> Result<()> {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_agent_unhealthy(&self, _event: &AgentEvent, _check: &HealthCheck) -> Result<()> {
            self.unhealthy.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_fails() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("a", TestHooks::default()))
            .await
            .expect("first registration");

        let result = registry.register(agent("a", TestHooks::default())).await;
        assert!(matches!(result, Err(WardenError::DuplicateAgent(id)) if id == "a"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_unknown_fails() {
        let registry = AgentRegistry::new();
        let result = registry.unregister("ghost").await;
        assert!(matches!(result, Err(WardenError::UnknownAgent(id)) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_register_unregister_get_roundtrip() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("a", TestHooks::default()))
            .await
            .expect("register");

        registry.unregister("a").await.expect("unregister");
        assert!(registry.get("a").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_all_preserves_registration_order() {
        let registry = AgentRegistry::new();
        for id in ["c", "a", "b"] {
            registry
                .register(agent(id, TestHooks::default()))
                .await
                .expect("register");
        }

        let ids: Vec<String> = registry
            .get_all()
            .await
            .into_iter()
            .map(|info| info.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_start_all_isolates_failures() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("ok", TestHooks::default()))
            .await
            .expect("register");
        registry
            .register(agent(
                "broken",
                TestHooks {
                    fail_start: true,
                    ..Default::default()
                },
            ))
            .await
            .expect("register");

        let report = registry.start_all().await;
        assert_eq!(report.succeeded, vec!["ok".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert!(!report.all_succeeded());

        let ok = registry.get("ok").await.expect("agent");
        let broken = registry.get("broken").await.expect("agent");
        assert_eq!(ok.state().await, AgentState::Running);
        assert_eq!(broken.state().await, AgentState::Error);
    }

    #[tokio::test]
    async fn test_stop_all_isolates_failures() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("ok", TestHooks::default()))
            .await
            .expect("register");
        registry
            .register(agent(
                "stubborn",
                TestHooks {
                    fail_stop: true,
                    ..Default::default()
                },
            ))
            .await
            .expect("register");

        let report = registry.start_all().await;
        assert!(report.all_succeeded());

        let report = registry.stop_all().await;
        assert_eq!(report.succeeded, vec!["ok".to_string()]);
        assert_eq!(report.failed.len(), 1);

        let ok = registry.get("ok").await.expect("agent");
        assert_eq!(ok.state().await, AgentState::Stopped);
    }

    #[tokio::test]
    async fn test_start_all_skips_disabled_agents() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("active", TestHooks::default()))
            .await
            .expect("register");
        registry
            .register(disabled_agent("parked"))
            .await
            .expect("register");

        let report = registry.start_all().await;
        assert_eq!(report.succeeded, vec!["active".to_string()]);
        assert_eq!(report.skipped, vec!["parked".to_string()]);

        let parked = registry.get("parked").await.expect("agent");
        assert_eq!(parked.state().await, AgentState::Stopped);
    }

    #[tokio::test]
    async fn test_registry_forwards_agent_events() {
        let registry = AgentRegistry::new();
        let recorder = Arc::new(RegistryRecorder::default());
        registry.subscribe(recorder.clone()).await;

        registry
            .register(agent(
                "a",
                TestHooks {
                    check_error: Some("down".to_string()),
                    ..Default::default()
                },
            ))
            .await
            .expect("register");

        let a = registry.get("a").await.expect("agent");
        // Probe before starting so the unhealthy event cannot race the
        // scheduled check.
        a.check_health().await;
        a.start().await.expect("start");
        a.stop().await.expect("stop");

        assert_eq!(recorder.started.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.stopped.load(Ordering::SeqCst), 1);
        assert!(recorder.unhealthy.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_unregistered_agent_no_longer_forwards() {
        let registry = AgentRegistry::new();
        let recorder = Arc::new(RegistryRecorder::default());
        registry.subscribe(recorder.clone()).await;

        registry
            .register(agent("a", TestHooks::default()))
            .await
            .expect("register");
        let a = registry.unregister("a").await.expect("unregister");

        a.start().await.expect("start");
        assert_eq!(recorder.started.load(Ordering::SeqCst), 0);
    }
}
