//! Tool Registry - central registration and lookup for all tools.
//!
//! The registry is built once at startup, then shared read-only (behind an
//! `Arc`) by the dispatcher and every session. It is never mutated after
//! construction, so no locking is needed.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::Tool;
use tracing::{debug, info};

use super::definitions::{AngelDetailsTool, AngelExistenceTool};
use super::error::ToolError;
use super::handlers::ToolHandler;
use super::schema::ToolDescriptor;
use crate::core::config::ToolsConfig;

/// A registered tool: its descriptor and the handler that executes it.
#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Tool registry - maps unique tool names to descriptors and handlers.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, RegisteredTool>,
    order: Vec<&'static str>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in tool.
    ///
    /// This is the single place where tools are registered. When adding a
    /// new tool, register it here.
    pub fn with_default_tools(config: &ToolsConfig) -> Result<Self, ToolError> {
        let mut registry = Self::new();
        registry.register(
            AngelExistenceTool::descriptor(),
            Arc::new(AngelExistenceTool::new(config.existence_latency())),
        )?;
        registry.register(
            AngelDetailsTool::descriptor(),
            Arc::new(AngelDetailsTool::new(config.details_latency())),
        )?;
        info!("Registered {} tools", registry.len());
        Ok(registry)
    }

    /// Register a tool. Fails if a tool with the same name exists.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ToolError> {
        let name = descriptor.name;
        if self.tools.contains_key(name) {
            return Err(ToolError::DuplicateName(name.to_string()));
        }

        debug!("Registering tool: {}", name);
        self.tools
            .insert(name, RegisteredTool { descriptor, handler });
        self.order.push(name);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<&RegisteredTool, ToolError> {
        self.tools
            .get(name)
            .ok_or_else(|| ToolError::unknown_tool(name, self.known_names()))
    }

    /// Get all tool names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    fn known_names(&self) -> Vec<String> {
        self.order.iter().map(|n| n.to_string()).collect()
    }

    /// Get all tools as Tool models (metadata), in registration order.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor.to_tool())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::{ToolArguments, ToolOutput};

    struct Noop;

    #[async_trait::async_trait]
    impl ToolHandler for Noop {
        async fn invoke(&self, _arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text("noop"))
        }
    }

    fn test_registry() -> ToolRegistry {
        ToolRegistry::with_default_tools(&ToolsConfig::instant()).unwrap()
    }

    #[test]
    fn test_registry_tool_names() {
        let names = test_registry().names();
        assert_eq!(names, vec!["query_angel_existence", "get_angel_details"]);
    }

    #[test]
    fn test_register_duplicate_name() {
        let mut registry = test_registry();
        let err = registry
            .register(AngelDetailsTool::descriptor(), Arc::new(Noop))
            .unwrap_err();
        assert_eq!(err, ToolError::DuplicateName("get_angel_details".into()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = test_registry();
        match registry.lookup("unknown") {
            Err(ToolError::UnknownTool { name, known }) => {
                assert_eq!(name, "unknown");
                assert_eq!(known, vec!["query_angel_existence", "get_angel_details"]);
            }
            other => panic!("expected UnknownTool, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_known() {
        let registry = test_registry();
        let tool = registry.lookup("get_angel_details").unwrap();
        assert_eq!(tool.descriptor.name, "get_angel_details");
    }

    #[test]
    fn test_list_tools_matches_names() {
        let registry = test_registry();
        let tools = registry.list_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(names, registry.names());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.list_tools().is_empty());
    }
}
