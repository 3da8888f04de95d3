//! 代理後端的請求與回應結構。
//! 模擬伺服器也以相同結構輸出，確保兩端契約一致。

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResult {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// `{status, result: {content, usage?}}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: String,
    pub result: ApiResult,
}

impl ApiResponse {
    pub fn success(content: impl Into<String>, usage: Option<Usage>) -> Self {
        Self {
            status: String::from("success"),
            result: ApiResult {
                content: content.into(),
                usage,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub available_agents: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
}
