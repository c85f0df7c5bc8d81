//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// SSE transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SseConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the endpoint that opens an event stream.
    #[serde(default = "default_sse_path")]
    pub sse_path: String,

    /// Path of the endpoint that accepts posted frames.
    #[serde(default = "default_message_path")]
    pub message_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Interval between keep-alive comments on idle streams, in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_sse_path() -> String {
    "/sse".to_string()
}

fn default_message_path() -> String {
    "/messages/".to_string()
}

fn default_cors() -> bool {
    true
}

fn default_keep_alive_secs() -> u64 {
    15
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            sse_path: default_sse_path(),
            message_path: default_message_path(),
            enable_cors: default_cors(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl SseConfig {
    /// Create an SSE config bound to the given address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let port = std::env::var("MCP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or_else(default_port);
        let host = std::env::var("MCP_HOST").unwrap_or_else(|_| default_host());
        let sse_path = std::env::var("MCP_SSE_PATH").unwrap_or_else(|_| default_sse_path());
        let message_path =
            std::env::var("MCP_MESSAGE_PATH").unwrap_or_else(|_| default_message_path());
        let enable_cors = std::env::var("MCP_CORS")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);
        let keep_alive_secs = std::env::var("MCP_KEEP_ALIVE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_keep_alive_secs);

        Self {
            host,
            port,
            sse_path,
            message_path,
            enable_cors,
            keep_alive_secs,
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        format!(
            "SSE on {} (stream: {}, messages: {})",
            self.address(),
            self.sse_path,
            self.message_path
        )
    }
}
