//! Invocation dispatcher.
//!
//! Resolves a tool name through the registry, validates the arguments against
//! the tool's descriptor, runs the handler and packages the outcome. Every
//! failure mode is represented as data: `dispatch` never returns an error, so
//! the transport always has a well-formed result to deliver.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::error::ToolError;
use super::handlers::ToolOutput;
use super::registry::ToolRegistry;

/// A single tool call, consumed once by the dispatcher.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub tool_name: String,
    pub arguments: Option<JsonObject>,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Option<JsonObject>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Outcome of a tool call.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    /// Name of the tool that was requested.
    pub tool_name: String,

    /// Whether the call succeeded.
    pub success: bool,

    /// Result payload. On failure, the text describes the error.
    pub output: ToolOutput,

    /// The error, if the call failed.
    pub error: Option<ToolError>,
}

impl InvocationResult {
    fn success(tool_name: String, output: ToolOutput) -> Self {
        Self {
            tool_name,
            success: true,
            output,
            error: None,
        }
    }

    fn failure(tool_name: String, error: ToolError) -> Self {
        Self {
            tool_name,
            success: false,
            output: ToolOutput::text(error.to_string()),
            error: Some(error),
        }
    }

    /// Convert to the MCP `tools/call` result shape.
    pub fn into_call_tool_result(self) -> CallToolResult {
        CallToolResult {
            content: vec![Content::text(self.output.text)],
            structured_content: self.output.structured,
            is_error: Some(!self.success),
            meta: None,
        }
    }
}

/// Dispatches invocation requests to registered tool handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Dispatch a request and wait for the handler to finish.
    pub async fn dispatch(&self, request: InvocationRequest) -> InvocationResult {
        self.dispatch_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Dispatch a request, abandoning the handler if `cancel` fires first.
    #[instrument(skip(self, request, cancel), fields(tool = %request.tool_name))]
    pub async fn dispatch_cancellable(
        &self,
        request: InvocationRequest,
        cancel: &CancellationToken,
    ) -> InvocationResult {
        let InvocationRequest {
            tool_name,
            arguments,
        } = request;

        let tool = match self.registry.lookup(&tool_name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!("Unknown tool requested: {}", tool_name);
                return InvocationResult::failure(tool_name, e);
            }
        };

        let arguments = match tool.descriptor.validate(arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!("Rejected arguments for {}: {}", tool_name, e);
                return InvocationResult::failure(tool_name, e);
            }
        };

        let outcome = tokio::select! {
            outcome = tool.handler.invoke(arguments) => outcome,
            _ = cancel.cancelled() => Err(ToolError::Cancelled),
        };

        match outcome {
            Ok(output) => {
                debug!("Tool {} completed", tool_name);
                InvocationResult::success(tool_name, output)
            }
            Err(e) => {
                warn!("Tool {} failed: {}", tool_name, e);
                InvocationResult::failure(tool_name, e)
            }
        }
    }
}
