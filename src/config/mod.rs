//! # Dispatch Configuration System
//!
//! YAML-based configuration with environment overrides. Every section has working
//! defaults, so `DispatchConfig::default()` is a complete configuration for tests and
//! embedding code.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dispatch_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration (environment auto-detected)
//! let manager = ConfigManager::load()?;
//!
//! let per_call = manager.config().per_call_timeout();
//! let bind = &manager.config().server.bind_address;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring dispatch-config.yaml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// HTTP surface and event stream settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Candidate sources and resolution bounds
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Step dispatch settings
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Ordered planning rules
    #[serde(default)]
    pub planning: PlanningConfig,

    /// Optional task snapshot storage
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Bound of the per-run event channel between orchestrator and stream
    pub event_channel_capacity: usize,
    pub keep_alive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: defaults::BIND_ADDRESS.to_string(),
            event_channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
            keep_alive_secs: defaults::KEEP_ALIVE_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Base URL of the peer registration store; `${VAR}` placeholders allowed
    pub registry_url: Option<String>,
    /// Addresses used when no registry is configured, or when it fails
    pub static_peers: Vec<String>,
    /// This service's own address, never treated as a candidate
    pub self_address: Option<String>,
    pub per_call_timeout_ms: u64,
    pub overall_budget_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            registry_url: None,
            static_peers: Vec::new(),
            self_address: None,
            per_call_timeout_ms: defaults::PER_CALL_TIMEOUT_MS,
            overall_budget_ms: defaults::OVERALL_BUDGET_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub environment: String,
    pub step_timeout_ms: u64,
    /// Whole-task bound; derived from discovery and step bounds when absent
    pub max_task_duration_ms: Option<u64>,
    /// Outbound payload; `{request}` is replaced by the request text
    pub message_template: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            step_timeout_ms: defaults::STEP_TIMEOUT_MS,
            max_task_duration_ms: None,
            message_template: defaults::MESSAGE_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub rules: Vec<PlanningRule>,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            rules: PlanningRule::builtin(),
        }
    }
}

/// One recognizable need and the peer capabilities that serve it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlanningRule {
    pub name: String,
    /// Lower runs earlier
    pub priority: u32,
    #[serde(default)]
    pub request_keywords: Vec<String>,
    #[serde(default)]
    pub capability_keywords: Vec<String>,
    /// Extra category tags recognizing this rule besides its name
    #[serde(default)]
    pub categories: Vec<String>,
}

impl PlanningRule {
    pub fn new(
        name: &str,
        priority: u32,
        request_keywords: &[&str],
        capability_keywords: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            priority,
            request_keywords: request_keywords.iter().map(|k| k.to_string()).collect(),
            capability_keywords: capability_keywords.iter().map(|k| k.to_string()).collect(),
            categories: Vec::new(),
        }
    }

    /// Life-safety services first, informational ones last
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new(
                "fire",
                10,
                &["fire", "burning", "smoke", "flame"],
                &["fire", "firefighter", "extinguish"],
            ),
            Self::new(
                "medical",
                20,
                &["ambulance", "injury", "injured", "medical", "hurt"],
                &["ambulance", "medical", "paramedic", "emergency medical"],
            ),
            Self::new(
                "police",
                30,
                &["police", "arrest", "criminal", "theft", "crime"],
                &["police", "crime", "investigation"],
            ),
            Self::new(
                "weather",
                90,
                &["weather", "forecast", "rain", "storm"],
                &["weather", "forecast", "meteorology"],
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub recent_task_limit: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_task_limit: defaults::RECENT_TASK_LIMIT,
        }
    }
}

impl DispatchConfig {
    /// Get the per-candidate resolution bound as Duration
    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery.per_call_timeout_ms)
    }

    /// Get the whole-discovery bound as Duration
    pub fn overall_budget(&self) -> Duration {
        Duration::from_millis(self.discovery.overall_budget_ms)
    }

    /// Get the per-step dispatch bound as Duration
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.execution.step_timeout_ms)
    }

    /// Whole-task bound for a plan of `plan_len` steps
    pub fn max_task_duration(&self, plan_len: usize) -> Duration {
        match self.execution.max_task_duration_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.overall_budget() + self.step_timeout() * plan_len as u32,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "server.bind_address",
                "server configuration",
            ));
        }

        if self.server.event_channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "server.event_channel_capacity",
                "0",
                "channel capacity must be greater than 0",
            ));
        }

        let timeouts = [
            ("discovery.per_call_timeout_ms", self.discovery.per_call_timeout_ms),
            ("discovery.overall_budget_ms", self.discovery.overall_budget_ms),
            ("execution.step_timeout_ms", self.execution.step_timeout_ms),
            (
                "execution.max_task_duration_ms",
                self.execution.max_task_duration_ms.unwrap_or(1),
            ),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "timeout must be greater than 0",
                ));
            }
        }

        if !self
            .execution
            .message_template
            .contains(defaults::REQUEST_PLACEHOLDER)
        {
            return Err(ConfigurationError::invalid_value(
                "execution.message_template",
                self.execution.message_template.clone(),
                format!("template must contain the {} placeholder", defaults::REQUEST_PLACEHOLDER),
            ));
        }

        let mut seen = HashSet::new();
        for rule in &self.planning.rules {
            let name = rule.name.trim();
            if name.is_empty() {
                return Err(ConfigurationError::invalid_planning_rule(
                    &rule.name,
                    "rule name must not be empty",
                ));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ConfigurationError::invalid_planning_rule(
                    name,
                    "duplicate rule name",
                ));
            }
            if rule.request_keywords.is_empty() && rule.categories.is_empty() {
                return Err(ConfigurationError::invalid_planning_rule(
                    name,
                    "rule needs request keywords or category tags",
                ));
            }
            if rule.capability_keywords.is_empty() {
                return Err(ConfigurationError::invalid_planning_rule(
                    name,
                    "rule needs capability keywords",
                ));
            }
        }

        Ok(())
    }
}
