//! Tool handler capability.
//!
//! Every tool registered with the [`ToolRegistry`](super::ToolRegistry)
//! implements [`ToolHandler`]. Handlers receive arguments that already passed
//! validation against their descriptor and produce either an output or a
//! typed [`ToolError`].

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::error::ToolError;
use super::schema::ToolArguments;

/// Successful output from a tool execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Human-readable result text.
    pub text: String,

    /// Optional structured result matching the tool's output schema.
    pub structured: Option<Value>,
}

impl ToolOutput {
    /// Create a text-only output.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }

    /// Create an output with a text summary and structured content.
    ///
    /// Falls back to text only if the data cannot be serialized.
    pub fn structured<T: Serialize>(text: impl Into<String>, data: &T) -> Self {
        let structured = match serde_json::to_value(data) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to serialize structured content: {}", e);
                None
            }
        };

        Self {
            text: text.into(),
            structured,
        }
    }
}

/// Capability implemented by every tool.
///
/// Handlers must not block the runtime: simulated or real latency has to be
/// awaited, never slept on a worker thread.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with validated arguments.
    async fn invoke(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Report {
        exists: bool,
    }

    #[test]
    fn test_structured_output() {
        let output = ToolOutput::structured("ok", &Report { exists: true });
        assert_eq!(output.text, "ok");
        assert_eq!(output.structured, Some(serde_json::json!({"exists": true})));
    }

    #[test]
    fn test_text_output_has_no_structured_content() {
        assert_eq!(ToolOutput::text("plain").structured, None);
    }
}
