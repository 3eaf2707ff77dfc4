//! Configuration schema definitions.
//!
//! The rule set (`log_level`, `default_target`, `rules`) sits at the top level
//! of the file, next to the sidecar settings. Every section has defaults so a
//! file containing only rules is a complete configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::PluginConfig;

/// Root configuration for the smart router sidecar.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Log level, default target and routing rules.
    #[serde(flatten)]
    pub plugin: PluginConfig,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Target name → upstream base URL (e.g. `"v2": "http://127.0.0.1:3002"`).
    pub upstreams: BTreeMap<String, String>,

    /// Request header carrying the routing decision to the upstream.
    pub route_header: RouteHeader,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Name of the header set to the decision target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RouteHeader(pub String);

impl Default for RouteHeader {
    fn default() -> Self {
        Self("x-route-target".to_string())
    }
}

impl AsRef<str> for RouteHeader {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
