//! Tool-specific error types.

use thiserror::Error;

/// Errors that can occur during tool registration, validation and execution.
///
/// None of these ever terminate a session: the dispatcher turns every one of
/// them into a failed invocation result that is delivered to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// A tool with the same name is already registered.
    #[error("Tool already registered: {0}")]
    DuplicateName(String),

    /// The requested tool was not found.
    #[error("Unknown tool: {name}. Available tools: {}", known.join(", "))]
    UnknownTool { name: String, known: Vec<String> },

    /// An argument did not match the tool's input schema.
    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    /// The requested angel category is not in the category table.
    #[error("未知的天使类别: {category}。可用类别: {}", available.join(", "))]
    UnknownCategory {
        category: String,
        available: Vec<String>,
    },

    /// The tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The invocation was cancelled before the handler finished.
    #[error("Tool execution cancelled")]
    Cancelled,
}

impl ToolError {
    /// Create a new "unknown tool" error.
    pub fn unknown_tool(name: impl Into<String>, known: Vec<String>) -> Self {
        Self::UnknownTool {
            name: name.into(),
            known,
        }
    }

    /// Create a new "invalid argument" error.
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }
}
