//! Tools domain module.
//!
//! Tools are named, schema-described operations that MCP clients invoke
//! through `tools/call`.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `schema.rs` - Tool descriptors and argument validation
//! - `handlers.rs` - The `ToolHandler` capability and tool output
//! - `registry.rs` - Write-once registry of descriptors and handlers
//! - `dispatcher.rs` - Lookup, validation and invocation of a single call
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` with a descriptor and a
//!    `ToolHandler` implementation
//! 2. Export it in `definitions/mod.rs`
//! 3. Register it in `ToolRegistry::with_default_tools()`

pub mod definitions;
mod dispatcher;
mod error;
mod handlers;
mod registry;
mod schema;

pub use dispatcher::{Dispatcher, InvocationRequest, InvocationResult};
pub use error::ToolError;
pub use handlers::{ToolHandler, ToolOutput};
pub use registry::{RegisteredTool, ToolRegistry};
pub use schema::{ParamSpec, ParamType, ToolArguments, ToolDescriptor};
