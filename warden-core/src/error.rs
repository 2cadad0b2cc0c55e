//! Error types for supervision operations

use crate::agent::AgentState;
use crate::config::ConfigViolation;

/// Result type for supervision operations
pub type Result<T> = std::result::Result<T, WardenError>;

/// Error types for the supervision runtime
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// Agent configuration rejected at construction time
    #[error("Invalid agent configuration: {0}")]
    InvalidConfiguration(#[from] ConfigViolation),

    /// Lifecycle operation attempted from the wrong state
    #[error("Cannot start agent '{agent_id}' while {state}")]
    InvalidStateTransition {
        agent_id: String,
        state: AgentState,
    },

    /// The agent's startup hook failed; the agent is left in the error state
    #[error("Agent '{agent_id}' failed to start: {reason}")]
    StartupFailure { agent_id: String, reason: String },

    /// The agent's shutdown hook failed; the agent is left in the error state
    #[error("Agent '{agent_id}' failed to stop: {reason}")]
    ShutdownFailure { agent_id: String, reason: String },

    /// An agent with the same identifier is already registered
    #[error("Agent already registered: {0}")]
    DuplicateAgent(String),

    /// No agent with that identifier is registered
    #[error("Agent not found: {0}")]
    UnknownAgent(String),

    /// Configuration file or environment loading failed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for WardenError {
    fn from(s: String) -> Self {
        WardenError::Other(s)
    }
}

impl From<&str> for WardenError {
    fn from(s: &str) -> Self {
        WardenError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for WardenError {
    fn from(err: anyhow::Error) -> Self {
        WardenError::Other(err.to_string())
    }
}
