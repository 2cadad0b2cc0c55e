//! Lifecycle event notification
//!
//! Supervised agents surface lifecycle and health transitions through an
//! explicit publish/subscribe interface: observers register typed callbacks
//! per event name, and the emitting agent awaits each handler in order.
//! Handler failures are logged, never propagated into lifecycle control flow.
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_core::events::{AgentObserver, AgentEvent};
//!
//! struct Alerting;
//!
//! #[async_trait::async_trait]
//! impl AgentObserver for Alerting {
//!     async fn on_unhealthy(&self, event: &AgentEvent, check: &HealthCheck) -> Result<()> {
//!         page_oncall(&event.agent_id, check).await
//!     }
//! }
//!
//! agent.subscribe(Arc::new(Alerting)).await;
//! ```

use crate::agent::AgentState;
use crate::error::Result;
use crate::health::HealthCheck;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Opaque unique token attached to every emitted event for traceability
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh correlation identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event emitted by a supervised agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    /// Identifier of the agent that emitted the event
    pub agent_id: String,

    /// Fresh correlation identifier, distinct per emission
    pub correlation_id: CorrelationId,

    /// When the event was emitted
    pub timestamp: DateTime<Utc>,

    /// Event payload
    #[serde(flatten)]
    pub kind: AgentEventKind,
}

impl AgentEvent {
    pub(crate) fn new(agent_id: impl Into<String>, kind: AgentEventKind) -> Self {
        Self {
            agent_id: agent_id.into(),
            correlation_id: CorrelationId::generate(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

/// Payload of an [`AgentEvent`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEventKind {
    /// The agent completed startup and is running
    Started,

    /// The agent completed shutdown and is stopped
    Stopped,

    /// A health probe reported an unhealthy result
    Unhealthy { check: HealthCheck },

    /// The lifecycle state machine transitioned
    StateChanged { from: AgentState, to: AgentState },
}

/// Observer of a single agent's lifecycle events.
///
/// Each method corresponds to one event name; all default to no-ops so
/// implementations register only the callbacks they care about.
#[async_trait]
pub trait AgentObserver: Send + Sync {
    /// Called after the agent transitions to `running`
    async fn on_started(&self, _event: &AgentEvent) -> Result<()> {
        Ok(())
    }

    /// Called after the agent transitions to `stopped`
    async fn on_stopped(&self, _event: &AgentEvent) -> Result<()> {
        Ok(())
    }

    /// Called when a health probe reports unhealthy
    async fn on_unhealthy(&self, _event: &AgentEvent, _check: &HealthCheck) -> Result<()> {
        Ok(())
    }

    /// Called on every lifecycle state transition, in transition order
    async fn on_state_changed(
        &self,
        _event: &AgentEvent,
        _from: AgentState,
        _to: AgentState,
    ) -> Result<()> {
        Ok(())
    }
}

/// Handle identifying a single observer registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registered observers of one agent
pub struct ObserverSet {
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn AgentObserver>)>>,
    next_id: AtomicU64,
}

impl ObserverSet {
    /// Create an empty observer set
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register an observer; the returned id can later remove it
    pub async fn subscribe(&self, observer: Arc<dyn AgentObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().await.push((id, observer));
        id
    }

    /// Remove a previously registered observer
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write().await;
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Dispatch an event to every registered observer.
    ///
    /// Handlers run in registration order and are awaited one at a time, so
    /// observers see a single agent's events in emission order.
    pub async fn emit(&self, event: &AgentEvent) {
        let observers: Vec<_> = self.observers.read().await.clone();
        for (_, observer) in observers {
            let outcome = match &event.kind {
                AgentEventKind::Started => observer.on_started(event).await,
                AgentEventKind::Stopped => observer.on_stopped(event).await,
                AgentEventKind::Unhealthy { check } => observer.on_unhealthy(event, check).await,
                AgentEventKind::StateChanged { from, to } => {
                    observer.on_state_changed(event, *from, *to).await
                }
            };
            if let Err(e) = outcome {
                tracing::warn!(
                    agent_id = %event.agent_id,
                    correlation_id = %event.correlation_id,
                    error = %e,
                    "Agent observer failed"
                );
            }
        }
    }
}

impl Default for ObserverSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer of registry-level events re-emitted from registered agents
#[async_trait]
pub trait RegistryObserver: Send + Sync {
    /// A registered agent started
    async fn on_agent_started(&self, _event: &AgentEvent) -> Result<()> {
        Ok(())
    }

    /// A registered agent stopped
    async fn on_agent_stopped(&self, _event: &AgentEvent) -> Result<()> {
        Ok(())
    }

    /// A registered agent reported unhealthy
    async fn on_agent_unhealthy(&self, _event: &AgentEvent, _check: &HealthCheck) -> Result<()> {
        Ok(())
    }
}

/// Registered observers of a registry
pub struct RegistryObserverSet {
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn RegistryObserver>)>>,
    next_id: AtomicU64,
}

impl RegistryObserverSet {
    /// Create an empty observer set
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register an observer; the returned id can later remove it
    pub async fn subscribe(&self, observer: Arc<dyn RegistryObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().await.push((id, observer));
        id
    }

    /// Remove a previously registered observer
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write().await;
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Re-emit an agent event at registry level, carrying the original payload.
    ///
    /// `state_changed` events stay agent-local and are not forwarded.
    pub async fn emit(&self, event: &AgentEvent) {
        let observers: Vec<_> = self.observers.read().await.clone();
        for (_, observer) in observers {
            let outcome = match &event.kind {
                AgentEventKind::Started => observer.on_agent_started(event).await,
                AgentEventKind::Stopped => observer.on_agent_stopped(event).await,
                AgentEventKind::Unhealthy { check } => {
                    observer.on_agent_unhealthy(event, check).await
                }
                AgentEventKind::StateChanged { .. } => continue,
            };
            if let Err(e) = outcome {
                tracing::warn!(
                    agent_id = %event.agent_id,
                    correlation_id = %event.correlation_id,
                    error = %e,
                    "Registry observer failed"
                );
            }
        }
    }
}

impl Default for RegistryObserverSet {
    fn default() -> Self {
        Self::new()
    }
}
