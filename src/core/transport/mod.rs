//! Transport layer for the MCP server.
//!
//! MCP is served over Server-Sent Events: clients receive frames on a
//! long-lived `GET` stream and post their own frames to a companion
//! endpoint. The transport only moves JSON-RPC frames around; sessions and
//! the protocol handler decide what they mean.

mod config;
mod error;
mod jsonrpc;
mod service;
pub mod sse;

pub use config::SseConfig;
pub use error::{TransportError, TransportResult};
pub use jsonrpc::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR,
};
pub use service::{TransportService, serve};
