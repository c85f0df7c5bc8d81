//! Angel MCP Server Library
//!
//! A Model Context Protocol (MCP) server that exposes two angel query tools to
//! remote clients over Server-Sent Events.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the protocol handler
//!   ([`McpServer`]), per-connection sessions and the SSE transport
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: the tool registry, argument schemas, the invocation
//!     dispatcher and the angel tool definitions
//!
//! # Example
//!
//! ```rust,no_run
//! use angel_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
