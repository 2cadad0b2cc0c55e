//! Health checks as data
//!
//! A health check is a point-in-time self-reported probe, distinct from
//! lifecycle state. Probe failures are converted into `unhealthy` results by
//! the supervised agent rather than propagated as errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a health probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Agent is operating normally
    Healthy,

    /// Agent is not operating correctly
    Unhealthy,

    /// Agent is operating with reduced capability
    Degraded,

    /// No probe has completed yet
    Unknown,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of a single health probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Probe outcome
    pub status: HealthStatus,

    /// When the probe completed
    pub timestamp: DateTime<Utc>,

    /// Human-readable explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Structured probe detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

impl HealthCheck {
    fn new(status: HealthStatus, message: Option<String>) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
            message,
            details: None,
        }
    }

    /// A passing check
    pub fn healthy() -> Self {
        Self::new(HealthStatus::Healthy, None)
    }

    /// A failing check with an explanation
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unhealthy, Some(message.into()))
    }

    /// A check reporting reduced capability
    pub fn degraded(message: impl Into<String>) -> Self {
        Self::new(HealthStatus::Degraded, Some(message.into()))
    }

    /// The state of an agent that has never been probed
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unknown, Some(message.into()))
    }

    /// Attach a structured detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}
