//! Core module containing shared infrastructure components.
//!
//! Configuration, error handling, the protocol handler, session lifecycle and
//! the SSE transport live here; tool behaviour lives in [`crate::domains`].

pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use server::McpServer;
pub use session::SessionManager;
pub use transport::TransportService;
