//! Configuration management for the MCP server.
//!
//! Configuration is populated from defaults, then a `.env` file and `MCP_*`
//! environment variables, then command-line flags (see `main.rs`).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{self, Error};
use super::transport::SseConfig;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// SSE transport configuration.
    pub transport: SseConfig,

    /// Session lifecycle configuration.
    pub sessions: SessionConfig,

    /// Tools domain configuration.
    pub tools: ToolsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// What happens to in-flight tool calls when a session closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InFlightPolicy {
    /// Signal every in-flight call to stop.
    #[default]
    Cancel,
    /// Let in-flight calls run to completion and deliver their results.
    Drain,
}

impl std::str::FromStr for InFlightPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cancel" => Ok(Self::Cancel),
            "drain" => Ok(Self::Drain),
            other => Err(format!("unknown in-flight policy: {}", other)),
        }
    }
}

/// Largest accepted per-session outbound buffer, in frames.
pub const MAX_OUTBOUND_BUFFER: usize = 65_536;

/// Session lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Policy applied to in-flight calls when a session closes.
    pub in_flight_policy: InFlightPolicy,

    /// Capacity of each session's outbound frame buffer.
    pub outbound_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            in_flight_policy: InFlightPolicy::Cancel,
            outbound_buffer: 64,
        }
    }
}

/// Configuration for the tools domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Simulated upstream latency of the existence query, in milliseconds.
    pub existence_latency_ms: u64,

    /// Simulated upstream latency of the details lookup, in milliseconds.
    pub details_latency_ms: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            existence_latency_ms: 1000,
            details_latency_ms: 1500,
        }
    }
}

impl ToolsConfig {
    /// Tools with no simulated latency.
    pub fn instant() -> Self {
        Self {
            existence_latency_ms: 0,
            details_latency_ms: 0,
        }
    }

    pub fn existence_latency(&self) -> Duration {
        Duration::from_millis(self.existence_latency_ms)
    }

    pub fn details_latency(&self) -> Duration {
        Duration::from_millis(self.details_latency_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "angel".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: SseConfig::default(),
            sessions: SessionConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Parse an environment variable, warning and ignoring unparsable values.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`, `MCP_PORT`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = SseConfig::from_env();

        if let Some(policy) = env_parse("MCP_INFLIGHT_POLICY") {
            config.sessions.in_flight_policy = policy;
        }
        if let Some(buffer) = env_parse::<usize>("MCP_SESSION_BUFFER") {
            config.sessions.outbound_buffer = buffer.max(1);
        }

        if let Some(ms) = env_parse("MCP_EXISTENCE_LATENCY_MS") {
            config.tools.existence_latency_ms = ms;
        }
        if let Some(ms) = env_parse("MCP_DETAILS_LATENCY_MS") {
            config.tools.details_latency_ms = ms;
        }

        config
    }

    /// Check the settings that would otherwise fail at router build time.
    pub fn validate(&self) -> error::Result<()> {
        let transport = &self.transport;
        for path in [&transport.sse_path, &transport.message_path] {
            if !path.starts_with('/') {
                return Err(Error::config(format!("Route '{}' must start with '/'", path)));
            }
        }
        if transport.sse_path == transport.message_path {
            return Err(Error::config("SSE and message paths must differ"));
        }
        let buffer = self.sessions.outbound_buffer;
        if buffer == 0 || buffer > MAX_OUTBOUND_BUFFER {
            return Err(Error::config(format!(
                "Session buffer must be between 1 and {}, got {}",
                MAX_OUTBOUND_BUFFER, buffer
            )));
        }
        if self.server.name.trim().is_empty() {
            return Err(Error::config("Server name must not be empty"));
        }
        Ok(())
    }
}

// Mutex to ensure env var tests run serially
#[cfg(test)]
pub(crate) static ENV_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
