//! `providers` 模組負責與代理後端通訊的具體實作。
//!
//! 每個子模組都實作 `AgentBackend` trait，呼叫端只需知道代理類型，
//! 不需關心請求是送往 HTTP 服務還是由本地模擬產生。

/// `http` 模組：透過 HTTP 向 `/city-info`、`/crypto`、`/law` 端點發送查詢。
pub mod http;
/// `simulated` 模組：不經網路、以固定延遲模擬代理回應，支援逐字串流。
pub mod simulated;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::agent::config::AgentVariant;
use crate::agent::message::ToolAction;

pub use http::models::{ApiResponse, ApiResult, HealthResponse, QueryRequest, Usage};
pub use http::HttpBackend;
pub use simulated::SimulatedBackend;

/// 後端呼叫失敗的原因。呼叫端負責將其轉換為使用者可見的訊息。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 後端回傳非 2xx 狀態碼。
    #[error("Backend error: {status} {reason}")]
    Status { status: u16, reason: String },
    /// 連線或傳輸失敗。
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 回應內容無法解析。
    #[error("failed to decode backend response: {0}")]
    Decode(#[source] reqwest::Error),
    /// 回應格式正確，但 `status` 不是 `success`。
    #[error("backend answered with status `{0}`")]
    Rejected(String),
}

/// 增量回覆中的一個片段，依產生順序傳遞；生產者結束時關閉 channel。
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyChunk {
    /// 附加到代理訊息尾端的一段文字。
    Token(String),
    /// 工具步驟的新狀態。
    Tool(ToolAction),
}

/// 所有代理後端都必須遵守的介面。
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// 後端名稱，用於狀態列與日誌。
    fn name(&self) -> &str;

    /// 送出一次查詢並等待完整回應。不重試、不設逾時。
    async fn send_message(
        &self,
        query: &str,
        variant: AgentVariant,
    ) -> Result<ApiResponse, GatewayError>;

    /// 檢查後端是否可用。
    async fn health(&self) -> Result<HealthResponse, GatewayError>;

    /// 此後端是否以 `stream_message` 逐段回覆。
    fn streams_replies(&self) -> bool {
        false
    }

    /// 以增量方式回覆。預設實作把完整回應當成單一片段送出。
    async fn stream_message(
        &self,
        query: &str,
        variant: AgentVariant,
        tx: UnboundedSender<ReplyChunk>,
    ) -> Result<(), GatewayError> {
        let response = self.send_message(query, variant).await?;
        let _ = tx.send(ReplyChunk::Token(response.result.content));
        Ok(())
    }
}
