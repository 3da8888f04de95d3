use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use log::debug;
use serde_json::json;
use tokio::sync::mpsc::UnboundedSender;

use crate::agent::config::AgentVariant;
use crate::agent::message::{ToolAction, ToolStatus, next_id};
use crate::server::canned;

use super::{AgentBackend, ApiResponse, GatewayError, HealthResponse, ReplyChunk};

/// 不經網路的代理後端，以固定延遲回覆關鍵字對應的預設內容。
///
/// 用於離線模式與測試；延遲為零時不會等待。
pub struct SimulatedBackend {
    latency: Duration,
}

impl SimulatedBackend {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    async fn pause(&self, span: Duration) {
        if !span.is_zero() {
            tokio::time::sleep(span).await;
        }
    }
}

#[async_trait]
impl AgentBackend for SimulatedBackend {
    fn name(&self) -> &str {
        "Simulated"
    }

    async fn send_message(
        &self,
        query: &str,
        variant: AgentVariant,
    ) -> Result<ApiResponse, GatewayError> {
        self.pause(self.latency).await;
        let content = canned::reply_for(query, Local::now());
        debug!("Simulated {} reply ({} chars)", variant.slug(), content.len());
        let usage = canned::estimate_usage(query, &content);
        Ok(ApiResponse::success(content, Some(usage)))
    }

    async fn health(&self) -> Result<HealthResponse, GatewayError> {
        Ok(HealthResponse {
            status: String::from("healthy"),
            available_agents: AgentVariant::ALL
                .iter()
                .map(|variant| variant.slug().to_string())
                .collect(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        })
    }

    fn streams_replies(&self) -> bool {
        true
    }

    /// 先回報一個工具步驟（若問題命中已知主題），再逐字送出回覆。
    async fn stream_message(
        &self,
        query: &str,
        variant: AgentVariant,
        tx: UnboundedSender<ReplyChunk>,
    ) -> Result<(), GatewayError> {
        let step = self.latency / 4;
        if let Some(topic) = canned::classify(query) {
            let mut action = ToolAction::pending(next_id(), topic.tool_name());
            let _ = tx.send(ReplyChunk::Tool(action.clone()));
            self.pause(step).await;

            // 以下狀態轉換皆為合法的前進，不會失敗。
            let _ = action.advance(ToolStatus::Running);
            action.set_progress(50);
            let _ = tx.send(ReplyChunk::Tool(action.clone()));
            self.pause(step).await;

            let _ = action.advance(ToolStatus::Completed);
            action.result = Some(json!({ "agent": variant.slug(), "query": query }));
            let _ = tx.send(ReplyChunk::Tool(action));
        } else {
            self.pause(step).await;
        }

        let content = canned::reply_for(query, Local::now());
        let words: Vec<&str> = content.split_inclusive(' ').collect();
        let per_word = step / (words.len().max(1) as u32);
        for word in words {
            if tx.send(ReplyChunk::Token(word.to_string())).is_err() {
                break;
            }
            self.pause(per_word).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn streamed_tokens_rebuild_the_full_reply() {
        let backend = SimulatedBackend::new(Duration::ZERO);
        let (tx, mut rx) = mpsc::unbounded_channel();
        backend
            .stream_message("What's the weather in London?", AgentVariant::CityInfo, tx)
            .await
            .unwrap();

        let mut text = String::new();
        let mut statuses = Vec::new();
        while let Some(chunk) = rx.recv().await {
            match chunk {
                ReplyChunk::Token(token) => text.push_str(&token),
                ReplyChunk::Tool(action) => statuses.push(action.status),
            }
        }
        assert_eq!(text, canned::WEATHER_REPLY);
        assert_eq!(
            statuses,
            vec![ToolStatus::Pending, ToolStatus::Running, ToolStatus::Completed]
        );
    }

    #[tokio::test]
    async fn unmatched_queries_report_no_tool() {
        let backend = SimulatedBackend::new(Duration::ZERO);
        let (tx, mut rx) = mpsc::unbounded_channel();
        backend
            .stream_message("hello there", AgentVariant::Law, tx)
            .await
            .unwrap();
        while let Some(chunk) = rx.recv().await {
            assert!(matches!(chunk, ReplyChunk::Token(_)));
        }
    }

    #[tokio::test]
    async fn single_reply_carries_usage() {
        let backend = SimulatedBackend::new(Duration::ZERO);
        let response = backend
            .send_message("bitcoin?", AgentVariant::Crypto)
            .await
            .unwrap();
        assert_eq!(response.result.content, canned::CRYPTO_REPLY);
        assert_eq!(response.result.usage.unwrap().prompt_tokens, 1);
    }
}
