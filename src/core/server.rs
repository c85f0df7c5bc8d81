//! MCP protocol handler.
//!
//! `McpServer` answers the protocol-level requests (`initialize`,
//! `tools/list`, `tools/call`) by delegating to the tools domain. It holds no
//! per-connection state: sessions own that, and share one `McpServer` (and
//! through it one read-only [`ToolRegistry`]).

use rmcp::model::{CallToolResult, ServerCapabilities};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::config::Config;
use super::error::Result;
use crate::domains::tools::{Dispatcher, InvocationRequest, ToolRegistry};

/// Protocol versions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

const INSTRUCTIONS: &str =
    "Angel query server. Use query_angel_existence to ask whether angels exist, \
     and get_angel_details to describe a category (guardian, messenger, healing).";

/// The protocol handler shared by every session.
#[derive(Debug, Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Dispatcher over the read-only tool registry.
    dispatcher: Dispatcher,
}

impl McpServer {
    /// Create a new MCP server with the built-in tools.
    pub fn new(config: Config) -> Result<Self> {
        let registry = ToolRegistry::with_default_tools(&config.tools)?;
        Ok(Self::with_registry(config, Arc::new(registry)))
    }

    /// Create a new MCP server around an already-built registry.
    pub fn with_registry(config: Config, registry: Arc<ToolRegistry>) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Dispatcher::new(registry),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.registry()
    }

    /// Build the `initialize` result.
    ///
    /// The client's requested protocol version is echoed back when supported;
    /// otherwise the newest supported version is offered.
    pub fn initialize(&self, params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let protocol_version = negotiate_protocol_version(requested);
        info!(
            "Initializing session (requested protocol {:?}, using {})",
            requested, protocol_version
        );

        let capabilities = serde_json::to_value(ServerCapabilities::builder().enable_tools().build())
            .unwrap_or_else(|_| json!({ "tools": {} }));

        json!({
            "protocolVersion": protocol_version,
            "capabilities": capabilities,
            "serverInfo": {
                "name": self.name(),
                "version": self.version()
            },
            "instructions": INSTRUCTIONS
        })
    }

    /// Build the `tools/list` result.
    pub fn list_tools(&self) -> Value {
        json!({ "tools": self.registry().list_tools() })
    }

    /// Call a tool. Tool-level failures are reported inside the result.
    #[instrument(skip(self, request, cancel), fields(tool = %request.tool_name))]
    pub async fn call_tool(
        &self,
        request: InvocationRequest,
        cancel: &CancellationToken,
    ) -> CallToolResult {
        info!("Calling tool");
        self.dispatcher
            .dispatch_cancellable(request, cancel)
            .await
            .into_call_tool_result()
    }
}

/// Pick the protocol version to use for a session.
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|r| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|v| **v == r))
        .copied()
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// Extract an invocation request from `tools/call` params.
pub fn parse_call_params(params: Option<Value>) -> std::result::Result<InvocationRequest, String> {
    let params = params.ok_or_else(|| "Missing params".to_string())?;

    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| "Missing tool name".to_string())?
        .to_string();

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => return Err("Tool arguments must be an object".to_string()),
    };

    Ok(InvocationRequest::new(name, arguments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ToolsConfig;
    use rmcp::model::RawContent;

    fn test_server() -> McpServer {
        let config = Config {
            tools: ToolsConfig::instant(),
            ..Config::default()
        };
        McpServer::new(config).unwrap()
    }

    #[test]
    fn test_negotiate_protocol_version() {
        assert_eq!(negotiate_protocol_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_protocol_version(Some("1999-01-01")), "2025-06-18");
        assert_eq!(negotiate_protocol_version(None), "2025-06-18");
    }

    #[test]
    fn test_initialize_result() {
        let server = test_server();
        let result = server.initialize(Some(&json!({"protocolVersion": "2025-03-26"})));
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "angel");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[test]
    fn test_list_tools() {
        let tools = test_server().list_tools();
        let names: Vec<_> = tools["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["query_angel_existence", "get_angel_details"]);
        assert_eq!(
            tools["tools"][1]["inputSchema"]["properties"]["category"]["default"],
            "guardian"
        );
    }

    #[test]
    fn test_parse_call_params() {
        let request =
            parse_call_params(Some(json!({"name": "get_angel_details", "arguments": {"category": "healing"}})))
                .unwrap();
        assert_eq!(request.tool_name, "get_angel_details");
        assert_eq!(request.arguments.unwrap()["category"], "healing");

        assert!(parse_call_params(None).is_err());
        assert!(parse_call_params(Some(json!({"arguments": {}}))).is_err());
        assert!(parse_call_params(Some(json!({"name": "x", "arguments": [1]}))).is_err());
    }

    #[tokio::test]
    async fn test_call_tool() {
        let result = test_server()
            .call_tool(
                InvocationRequest::new("get_angel_details", None),
                &CancellationToken::new(),
            )
            .await;
        assert_eq!(result.is_error, Some(false));
        if let RawContent::Text(text) = &result.content[0].raw {
            assert!(text.text.contains("守护天使"));
        } else {
            panic!("expected text content");
        }
    }
}
