//! Angel existence query tool.
//!
//! Asks the (mocked) angel API whether angels exist in this world. The
//! upstream is a stub, so the answer is always affirmative.

use std::time::Duration;

use rmcp::handler::server::tool::schema_for_type;
use schemars::JsonSchema;
use serde::Serialize;
use tracing::info;

use super::common::{ANGEL_API_BASE, fetch_angel_status, format_angel_result, simulate_latency};
use crate::domains::tools::{ToolArguments, ToolDescriptor, ToolError, ToolHandler, ToolOutput};

/// Structured output of the existence query.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AngelExistenceReport {
    /// Whether angels exist.
    pub exists: bool,
    /// Confidence of the answer, in percent.
    pub confidence: u8,
    pub message: String,
    pub source: String,
}

/// Angel Existence Query Tool implementation.
#[derive(Debug, Clone)]
pub struct AngelExistenceTool {
    latency: Duration,
}

impl AngelExistenceTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "query_angel_existence";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "查询这个世界是否存在天使。返回关于天使存在与否的详细信息。";

    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Descriptor for registration. The tool takes no arguments.
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION)
            .with_output_schema(schema_for_type::<AngelExistenceReport>().into())
    }
}

#[async_trait::async_trait]
impl ToolHandler for AngelExistenceTool {
    async fn invoke(&self, _arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        info!("Querying angel existence");
        simulate_latency(self.latency).await;

        let data = fetch_angel_status(&format!("{}/existence", ANGEL_API_BASE))
            .await
            .ok_or_else(|| ToolError::execution_failed("无法获取天使存在信息。"))?;

        let report = AngelExistenceReport {
            exists: data.exists,
            confidence: data.details.confidence,
            message: data.message.clone(),
            source: data.details.source.clone(),
        };

        Ok(ToolOutput::structured(format_angel_result(&data), &report))
    }
}
