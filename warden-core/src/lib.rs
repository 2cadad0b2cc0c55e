//! # Warden - Agent Supervision Runtime
//!
//! Warden governs the lifecycle of independently-implemented long-running
//! workers ("agents") and supervises populations of them as a unit:
//! - Lifecycle state machine (stopped / starting / running / stopping / error)
//! - Periodic health checking with overlap protection
//! - Explicit publish/subscribe lifecycle events with correlation ids
//! - A registry with failure-isolated fleet start/stop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use warden_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AgentConfig::builder("collector", "Log Collector", "1.0.0")
//!         .health_check_interval(Duration::from_secs(10))
//!         .build()?;
//!     let agent = SupervisedAgent::new(config, Arc::new(CollectorHooks::default()))?;
//!
//!     let registry = AgentRegistry::new();
//!     registry.register(agent).await?;
//!
//!     let report = registry.start_all().await;
//!     for (id, error) in &report.failed {
//!         eprintln!("{} failed to start: {}", id, error);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! A [`agent::SupervisedAgent`] wraps a concrete agent's three hooks
//! (`on_start`, `on_stop`, `health_check`) with a state machine and a
//! recurring health-check task it owns and cancels on stop. The
//! [`registry::AgentRegistry`] holds agents by identifier and fans bulk
//! operations out concurrently, collecting per-agent outcomes so one
//! failure never aborts the rest of the fleet.

pub mod agent;
pub mod config;
pub mod error;
pub mod events;
pub mod health;
pub mod registry;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{AgentHooks, AgentInfo, AgentMetadata, AgentState, SupervisedAgent};
    pub use crate::config::{
        AgentConfig, AgentConfigBuilder, ConfigViolation, ServerConfig, WardenConfig,
    };
    pub use crate::error::{Result, WardenError};
    pub use crate::events::{
        AgentEvent, AgentEventKind, AgentObserver, CorrelationId, ObserverSet, RegistryObserver,
        RegistryObserverSet, SubscriptionId,
    };
    pub use crate::health::{HealthCheck, HealthStatus};
    pub use crate::registry::{AgentRegistry, FleetReport};
}
