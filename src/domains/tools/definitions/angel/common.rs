//! Shared pieces of the angel tools: the mocked upstream API and formatting.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Base URL of the angel API. Never contacted: the upstream is mocked.
pub const ANGEL_API_BASE: &str = "https://angel-api.example.com";

/// User agent the upstream client would identify as.
pub const USER_AGENT: &str = "angel-query/1.0";

/// Response body of the angel API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AngelApiResponse {
    pub status: String,
    pub exists: bool,
    pub message: String,
    pub details: AngelApiDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AngelApiDetails {
    pub confidence: u8,
    pub source: String,
}

/// Query the angel API.
///
/// This is a stub: no request is sent, and the answer is always that angels
/// exist with full confidence.
pub async fn fetch_angel_status(url: &str) -> Option<AngelApiResponse> {
    debug!("Mock angel API request: GET {} ({})", url, USER_AGENT);

    Some(AngelApiResponse {
        status: "success".to_string(),
        exists: true,
        message: "这个世界存在天使".to_string(),
        details: AngelApiDetails {
            confidence: 100,
            source: "天使数据库".to_string(),
        },
    })
}

/// Format an API response as a readable report.
pub fn format_angel_result(result: &AngelApiResponse) -> String {
    format!(
        "查询结果: {}\n置信度: {}%\n消息: {}",
        if result.exists { "存在" } else { "不存在" },
        result.details.confidence,
        result.message
    )
}

/// Simulate upstream latency without blocking the runtime.
pub async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_upstream_always_affirms() {
        let response = fetch_angel_status(&format!("{}/existence", ANGEL_API_BASE))
            .await
            .unwrap();
        assert_eq!(response.status, "success");
        assert!(response.exists);
        assert_eq!(response.details.confidence, 100);
    }

    #[test]
    fn test_format_angel_result() {
        let response = AngelApiResponse {
            status: "success".into(),
            exists: false,
            message: "无".into(),
            details: AngelApiDetails {
                confidence: 0,
                source: "test".into(),
            },
        };
        assert_eq!(
            format_angel_result(&response),
            "查询结果: 不存在\n置信度: 0%\n消息: 无"
        );
    }
}
