//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::{NewRoute, RouteError};

/// Root configuration for the command router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener for user traffic; every request here is dispatched.
    pub user: ListenerConfig,

    /// Listener for the route admin API.
    pub control: ListenerConfig,

    /// Listener for the per-request data API used by commands.
    pub data: ListenerConfig,

    /// Command execution settings.
    pub execution: ExecutionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Routes added at startup, in file order.
    pub routes: Vec<RouteConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            user: ListenerConfig::new("0.0.0.0:8080"),
            control: ListenerConfig::new("127.0.0.1:8081"),
            data: ListenerConfig::new("127.0.0.1:8082"),
            execution: ExecutionConfig::default(),
            observability: ObservabilityConfig::default(),
            routes: Vec::new(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl ListenerConfig {
    pub fn new(bind_address: impl Into<String>) -> Self {
        Self {
            bind_address: bind_address.into(),
        }
    }
}

/// Command execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Entrypoint used by routes that do not name one.
    pub default_entrypoint: String,

    /// Kill commands running longer than this many seconds (0 = never).
    pub timeout_secs: u64,

    /// Maximum buffered request body in bytes.
    pub max_body_size: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_entrypoint: "/bin/sh -c".to_string(),
            timeout_secs: 0,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "command_router=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A route seeded from the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// HTTP method to match exactly.
    pub method: String,

    /// Path template, e.g. `/listDir/{dirname}`.
    pub url_pattern: String,

    /// Entrypoint; falls back to `execution.default_entrypoint`.
    #[serde(default)]
    pub entrypoint: Option<String>,

    /// Command text passed to the entrypoint.
    #[serde(default)]
    pub command: String,
}

impl RouteConfig {
    /// Validate into a route ready for the table.
    pub fn to_new_route(&self, default_entrypoint: &str) -> Result<NewRoute, RouteError> {
        NewRoute::new(
            self.method.clone(),
            self.url_pattern.clone(),
            self.entrypoint.as_deref().unwrap_or(default_entrypoint),
            self.command.clone(),
        )
    }
}
