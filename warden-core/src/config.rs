//! Configuration types for the supervision runtime
//!
//! Agent configuration is validated at construction time: an invalid config
//! never produces a usable agent.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single rejected property of an agent configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigViolation {
    #[error("agent id must not be empty")]
    EmptyId,

    #[error("agent name must not be empty")]
    EmptyName,

    #[error("version '{0}' is not MAJOR.MINOR.PATCH")]
    MalformedVersion(String),

    #[error("health check interval must be positive")]
    ZeroHealthCheckInterval,

    #[error("max retries must be positive")]
    ZeroMaxRetries,

    #[error("timeout must be positive")]
    ZeroTimeout,
}

/// Immutable configuration supplied when constructing a supervised agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique identifier within a registry
    pub id: String,

    /// Display name
    pub name: String,

    /// Semantic version string (`MAJOR.MINOR.PATCH`)
    pub version: String,

    /// Whether fleet-level operations should start this agent
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Identifiers of agents this one depends on (informational only)
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Interval between recurring health checks
    #[serde(with = "humantime_serde", default = "default_health_check_interval")]
    pub health_check_interval: Duration,

    /// Retry budget available to the concrete agent (informational only)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Operation timeout available to the concrete agent (informational only)
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

fn default_enabled() -> bool {
    true
}

fn default_health_check_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl AgentConfig {
    /// Create a builder with the required identity fields
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> AgentConfigBuilder {
        AgentConfigBuilder::new(id, name, version)
    }

    /// Validate the configuration, rejecting the first violation found.
    pub fn validate(&self) -> std::result::Result<(), ConfigViolation> {
        if self.id.trim().is_empty() {
            return Err(ConfigViolation::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ConfigViolation::EmptyName);
        }
        if !is_semver(&self.version) {
            return Err(ConfigViolation::MalformedVersion(self.version.clone()));
        }
        if self.health_check_interval.is_zero() {
            return Err(ConfigViolation::ZeroHealthCheckInterval);
        }
        if self.max_retries == 0 {
            return Err(ConfigViolation::ZeroMaxRetries);
        }
        if self.timeout.is_zero() {
            return Err(ConfigViolation::ZeroTimeout);
        }
        Ok(())
    }
}

/// `MAJOR.MINOR.PATCH` with plain numeric components
fn is_semver(version: &str) -> bool {
    let mut parts = version.split('.');
    let numeric = |part: Option<&str>| {
        part.is_some_and(|p| {
            !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) && p.parse::<u64>().is_ok()
        })
    };
    numeric(parts.next()) && numeric(parts.next()) && numeric(parts.next()) && parts.next().is_none()
}

/// Builder for [`AgentConfig`]; `build()` validates and fails fast.
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    /// Create a new configuration builder
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            config: AgentConfig {
                id: id.into(),
                name: name.into(),
                version: version.into(),
                enabled: default_enabled(),
                dependencies: Vec::new(),
                health_check_interval: default_health_check_interval(),
                max_retries: default_max_retries(),
                timeout: default_timeout(),
            },
        }
    }

    /// Set whether fleet-level operations start this agent
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Add a dependency identifier
    pub fn dependency(mut self, id: impl Into<String>) -> Self {
        self.config.dependencies.push(id.into());
        self
    }

    /// Set the recurring health check interval
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval = interval;
        self
    }

    /// Set the retry budget
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the operation timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> crate::error::Result<AgentConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Host-level configuration: the HTTP surface plus the agent fleet
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WardenConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Fleet of agents to construct and supervise
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP surface binds to
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (warden.toml or path from WARDEN_CONFIG_PATH)
    /// 3. Environment variable overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is invalid or any agent
    /// config fails validation.
    pub fn load() -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Toml},
        };

        let mut figment = Figment::new()
            .merge(Toml::file("warden.toml"))
            .merge(Env::prefixed("WARDEN_").split("_"));

        if let Ok(path) = std::env::var("WARDEN_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: WardenConfig = figment.extract().map_err(|e| {
            crate::error::WardenError::Configuration(format!("Failed to load configuration: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or any agent
    /// config fails validation.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Toml},
        };

        let config: WardenConfig =
            Figment::new()
                .merge(Toml::file(path))
                .extract()
                .map_err(|e| {
                    crate::error::WardenError::Configuration(format!(
                        "Failed to load configuration file: {}",
                        e
                    ))
                })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every agent config and reject duplicate identifiers.
    pub fn validate(&self) -> crate::error::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for agent in &self.agents {
            agent.validate()?;
            if !seen.insert(agent.id.as_str()) {
                return Err(crate::error::WardenError::Configuration(format!(
                    "Duplicate agent id in fleet configuration: {}",
                    agent.id
                )));
            }
        }
        Ok(())
    }
}
