//! Supervised agent implementation
//!
//! A [`SupervisedAgent`] wraps a concrete agent's hooks with a lifecycle
//! state machine, a recurring health-check task, and event notification.
//! Concrete agents supply three hooks via [`AgentHooks`]: `on_start`,
//! `on_stop`, and `health_check`; everything else is owned by the wrapper.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = AgentConfig::builder("collector", "Log Collector", "1.0.0")
//!     .health_check_interval(Duration::from_secs(10))
//!     .build()?;
//!
//! let agent = SupervisedAgent::new(config, Arc::new(CollectorHooks::default()))?;
//! agent.start().await?;
//!
//! let info = agent.info().await;
//! assert_eq!(info.state, AgentState::Running);
//! ```

use crate::config::AgentConfig;
use crate::error::{Result, WardenError};
use crate::events::{AgentEvent, AgentEventKind, AgentObserver, ObserverSet, SubscriptionId};
use crate::health::{HealthCheck, HealthStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Lifecycle state of a supervised agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    /// Initial state; also reached after a clean shutdown
    Stopped,

    /// Startup hook in progress
    Starting,

    /// Agent is running and health checks are scheduled
    Running,

    /// Shutdown hook in progress
    Stopping,

    /// A startup or shutdown hook failed; caller must recover explicitly
    Error,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentState::Stopped => write!(f, "stopped"),
            AgentState::Starting => write!(f, "starting"),
            AgentState::Running => write!(f, "running"),
            AgentState::Stopping => write!(f, "stopping"),
            AgentState::Error => write!(f, "error"),
        }
    }
}

/// Hooks supplied by a concrete agent implementation.
///
/// The supervision core treats the agent's internal behavior as opaque: it
/// only drives these three hooks. Hooks may be long-running; the core awaits
/// them without blocking other agents.
#[async_trait]
pub trait AgentHooks: Send + Sync {
    /// Bring the concrete agent up. A failure leaves the agent in the
    /// `error` state.
    async fn on_start(&self) -> Result<()>;

    /// Tear the concrete agent down. A failure leaves the agent in the
    /// `error` state.
    async fn on_stop(&self) -> Result<()>;

    /// Probe the concrete agent's health. Errors are converted into
    /// `unhealthy` results by the supervisor, never propagated.
    async fn health_check(&self) -> Result<HealthCheck>;
}

/// Read-only snapshot of a supervised agent
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    /// Agent identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Current lifecycle state
    pub state: AgentState,

    /// Most recent health check (or the `unknown` default)
    pub health: HealthCheck,

    /// When the agent last started; absent if never started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Snapshot time
    pub last_seen: DateTime<Utc>,

    /// Derived metadata
    pub metadata: AgentMetadata,
}

/// Derived metadata included in an [`AgentInfo`] snapshot
#[derive(Debug, Clone, Serialize)]
pub struct AgentMetadata {
    /// Configured semantic version
    pub version: String,

    /// Configured dependency identifiers
    pub dependencies: Vec<String>,

    /// Milliseconds since the last start; zero if never started
    pub uptime_ms: u64,
}

/// A concrete agent wrapped with lifecycle, health scheduling, and events.
///
/// Cheap to clone; clones share the same underlying agent.
#[derive(Clone)]
pub struct SupervisedAgent {
    config: Arc<AgentConfig>,
    hooks: Arc<dyn AgentHooks>,
    state: Arc<RwLock<AgentState>>,
    started_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    last_check: Arc<RwLock<HealthCheck>>,
    observers: Arc<ObserverSet>,
    /// Serializes start/stop so no two lifecycle transitions run
    /// concurrently on one agent.
    op_lock: Arc<Mutex<()>>,
    /// At most one health check per agent may be in flight.
    check_in_flight: Arc<AtomicBool>,
    health_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SupervisedAgent {
    /// Wrap a concrete agent's hooks. The configuration is validated first;
    /// an invalid config prevents agent creation entirely.
    pub fn new(config: AgentConfig, hooks: Arc<dyn AgentHooks>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            hooks,
            state: Arc::new(RwLock::new(AgentState::Stopped)),
            started_at: Arc::new(RwLock::new(None)),
            last_check: Arc::new(RwLock::new(HealthCheck::unknown(
                "health check has not run yet",
            ))),
            observers: Arc::new(ObserverSet::new()),
            op_lock: Arc::new(Mutex::new(())),
            check_in_flight: Arc::new(AtomicBool::new(false)),
            health_task: Arc::new(Mutex::new(None)),
        })
    }

    /// Agent identifier
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Whether fleet-level operations should start this agent
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Current lifecycle state
    pub async fn state(&self) -> AgentState {
        *self.state.read().await
    }

    /// Register a lifecycle observer
    pub async fn subscribe(&self, observer: Arc<dyn AgentObserver>) -> SubscriptionId {
        self.observers.subscribe(observer).await
    }

    /// Remove a previously registered observer
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id).await
    }

    /// Start the agent.
    ///
    /// Only legal from the `stopped` state. On success the agent is
    /// `running` and its recurring health check is scheduled, with an
    /// initial check fired immediately. On hook failure the agent lands in
    /// `error` and must be recovered explicitly (a `stop()` runs the
    /// shutdown hook and returns it to `stopped`).
    pub async fn start(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        let current = *self.state.read().await;
        if current != AgentState::Stopped {
            return Err(WardenError::InvalidStateTransition {
                agent_id: self.config.id.clone(),
                state: current,
            });
        }

        info!(agent_id = %self.config.id, name = %self.config.name, "Starting agent");
        self.transition(AgentState::Starting).await;
        *self.started_at.write().await = Some(Utc::now());

        if let Err(e) = self.hooks.on_start().await {
            warn!(agent_id = %self.config.id, error = %e, "Agent startup hook failed");
            self.transition(AgentState::Error).await;
            return Err(WardenError::StartupFailure {
                agent_id: self.config.id.clone(),
                reason: e.to_string(),
            });
        }

        self.transition(AgentState::Running).await;
        let task = self.spawn_health_loop();
        *self.health_task.lock().await = Some(task);

        self.observers
            .emit(&AgentEvent::new(&self.config.id, AgentEventKind::Started))
            .await;
        info!(agent_id = %self.config.id, "Agent started");
        Ok(())
    }

    /// Stop the agent.
    ///
    /// Idempotent: a no-op when already `stopped` or `stopping`. The
    /// health-check task is cancelled before the shutdown hook runs, so no
    /// check can fire mid-shutdown. On hook failure the agent lands in
    /// `error`.
    pub async fn stop(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        let current = *self.state.read().await;
        if matches!(current, AgentState::Stopped | AgentState::Stopping) {
            debug!(agent_id = %self.config.id, state = %current, "Stop requested while already stopped; ignoring");
            return Ok(());
        }

        info!(agent_id = %self.config.id, "Stopping agent");
        self.transition(AgentState::Stopping).await;

        if let Some(task) = self.health_task.lock().await.take() {
            task.abort();
        }

        if let Err(e) = self.hooks.on_stop().await {
            warn!(agent_id = %self.config.id, error = %e, "Agent shutdown hook failed");
            self.transition(AgentState::Error).await;
            return Err(WardenError::ShutdownFailure {
                agent_id: self.config.id.clone(),
                reason: e.to_string(),
            });
        }

        self.transition(AgentState::Stopped).await;
        self.observers
            .emit(&AgentEvent::new(&self.config.id, AgentEventKind::Stopped))
            .await;
        info!(agent_id = %self.config.id, "Agent stopped");
        Ok(())
    }

    /// Run a health check now, independent of lifecycle state.
    ///
    /// Never fails: hook errors become `unhealthy` results. If a check is
    /// already in flight the cached most-recent result is returned instead
    /// of stacking a second probe.
    pub async fn check_health(&self) -> HealthCheck {
        match self.run_guarded_check().await {
            Some(check) => check,
            None => {
                debug!(agent_id = %self.config.id, "Health check already in flight; returning most recent result");
                self.last_check.read().await.clone()
            }
        }
    }

    /// Snapshot the agent. Pure read; always succeeds.
    pub async fn info(&self) -> AgentInfo {
        let state = *self.state.read().await;
        let health = self.last_check.read().await.clone();
        let started_at = *self.started_at.read().await;
        let uptime_ms = started_at
            .map(|t| (Utc::now() - t).num_milliseconds().max(0) as u64)
            .unwrap_or(0);

        AgentInfo {
            id: self.config.id.clone(),
            name: self.config.name.clone(),
            state,
            health,
            started_at,
            last_seen: Utc::now(),
            metadata: AgentMetadata {
                version: self.config.version.clone(),
                dependencies: self.config.dependencies.clone(),
                uptime_ms,
            },
        }
    }

    async fn transition(&self, to: AgentState) {
        let from = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut *state, to)
        };
        debug!(agent_id = %self.config.id, %from, %to, "Lifecycle transition");
        self.observers
            .emit(&AgentEvent::new(
                &self.config.id,
                AgentEventKind::StateChanged { from, to },
            ))
            .await;
    }

    /// Recurring health-check task. The first tick fires immediately so
    /// health status is available without waiting a full interval; a failed
    /// initial check cannot abort startup, which has already completed.
    fn spawn_health_loop(&self) -> JoinHandle<()> {
        let agent = self.clone();
        let period = self.config.health_check_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let agent = agent.clone();
                tokio::spawn(async move {
                    if agent.run_guarded_check().await.is_none() {
                        debug!(agent_id = %agent.config.id, "Previous health check still in flight; skipping tick");
                    }
                });
            }
        })
    }

    /// Run the hook once unless a check is already outstanding. Returns
    /// `None` when skipped.
    async fn run_guarded_check(&self) -> Option<HealthCheck> {
        if self
            .check_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }

        let check = match self.hooks.health_check().await {
            Ok(check) => check,
            Err(e) => {
                warn!(agent_id = %self.config.id, error = %e, "Health check hook failed");
                HealthCheck::unhealthy(e.to_string())
            }
        };

        *self.last_check.write().await = check.clone();
        if check.status == HealthStatus::Unhealthy {
            warn!(
                agent_id = %self.config.id,
                message = check.message.as_deref().unwrap_or(""),
                "Agent reported unhealthy"
            );
            self.observers
                .emit(&AgentEvent::new(
                    &self.config.id,
                    AgentEventKind::Unhealthy {
                        check: check.clone(),
                    },
                ))
                .await;
        }

        self.check_in_flight.store(false, Ordering::SeqCst);
        Some(check)
    }
}
