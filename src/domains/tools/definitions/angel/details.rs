//! Angel category lookup tool.

use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use super::common::simulate_latency;
use crate::domains::tools::{
    ParamSpec, ParamType, ToolArguments, ToolDescriptor, ToolError, ToolHandler, ToolOutput,
};

/// Known angel categories and their descriptions, in display order.
pub const ANGEL_CATEGORIES: &[(&str, &str)] = &[
    (
        "guardian",
        "守护天使是保护人类的天使，常在人类遇到危险时出现。",
    ),
    ("messenger", "信使天使负责传递上帝的信息给人类。"),
    ("healing", "疗愈天使帮助人类恢复身心健康。"),
];

/// Category used when the caller does not name one.
pub const DEFAULT_CATEGORY: &str = "guardian";

/// Parameters for the category lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct AngelDetailsParams {
    pub category: String,
}

/// Look up the description of a category.
pub fn describe_category(category: &str) -> Result<&'static str, ToolError> {
    ANGEL_CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, description)| *description)
        .ok_or_else(|| ToolError::UnknownCategory {
            category: category.to_string(),
            available: ANGEL_CATEGORIES
                .iter()
                .map(|(name, _)| name.to_string())
                .collect(),
        })
}

/// Angel Details Tool implementation.
#[derive(Debug, Clone)]
pub struct AngelDetailsTool {
    latency: Duration,
}

impl AngelDetailsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_angel_details";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "获取特定类别天使的详细信息。";

    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Descriptor for registration.
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION).with_param(ParamSpec::optional(
            "category",
            ParamType::String,
            "天使类别 (guardian, messenger, healing)",
            Some(serde_json::Value::from(DEFAULT_CATEGORY)),
        ))
    }
}

#[async_trait::async_trait]
impl ToolHandler for AngelDetailsTool {
    async fn invoke(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: AngelDetailsParams = arguments.parse()?;
        info!("Looking up angel category: {}", params.category);

        simulate_latency(self.latency).await;

        describe_category(&params.category).map(ToolOutput::text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn lookup(arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let tool = AngelDetailsTool::new(Duration::ZERO);
        let arguments = AngelDetailsTool::descriptor()
            .validate(arguments.as_object().cloned())
            .unwrap();
        tool.invoke(arguments).await
    }

    #[tokio::test]
    async fn test_default_category_is_guardian() {
        let output = lookup(json!({})).await.unwrap();
        assert_eq!(output.text, "守护天使是保护人类的天使，常在人类遇到危险时出现。");
    }

    #[tokio::test]
    async fn test_each_category() {
        for (category, description) in ANGEL_CATEGORIES {
            let output = lookup(json!({ "category": category })).await.unwrap();
            assert_eq!(output.text, *description);
        }
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let err = lookup(json!({"category": "unknown-x"})).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "未知的天使类别: unknown-x。可用类别: guardian, messenger, healing"
        );
    }

    #[test]
    fn test_descriptor_default() {
        let descriptor = AngelDetailsTool::descriptor();
        assert_eq!(descriptor.params.len(), 1);
        assert!(!descriptor.params[0].required);
        assert_eq!(descriptor.params[0].default, Some(json!("guardian")));
    }
}
