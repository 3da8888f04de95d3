//! Mock backend: the chat, history and upload endpoints the client was
//! prototyped against, plus the three agent endpoints and a health probe.

pub mod canned;
pub mod handlers;
pub mod repository;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use log::info;
use tokio::net::TcpListener;

pub use repository::{ConversationRepository, InMemoryConversationRepository};

pub const DEFAULT_CHAT_LATENCY: Duration = Duration::from_millis(1000);
pub const DEFAULT_UPLOAD_LATENCY: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct MockServerState {
    pub repository: Arc<dyn ConversationRepository>,
    /// Delay before answering chat and agent queries.
    pub chat_latency: Duration,
    pub upload_latency: Duration,
}

impl MockServerState {
    pub fn new(
        repository: Arc<dyn ConversationRepository>,
        chat_latency: Duration,
        upload_latency: Duration,
    ) -> Self {
        Self {
            repository,
            chat_latency,
            upload_latency,
        }
    }

    /// State backed by the seeded in-memory history.
    pub fn seeded(chat_latency: Duration, upload_latency: Duration) -> Self {
        Self::new(
            Arc::new(InMemoryConversationRepository::seeded()),
            chat_latency,
            upload_latency,
        )
    }
}

pub fn mock_router(state: MockServerState) -> Router {
    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route(
            "/api/history",
            get(handlers::list_history).delete(handlers::delete_history),
        )
        .route("/api/upload", post(handlers::upload))
        .route("/city-info", post(handlers::city_info))
        .route("/crypto", post(handlers::crypto))
        .route("/law", post(handlers::law))
        .route("/health", get(handlers::health))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: MockServerState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("無法綁定位址: {}", addr))?;
    info!("Mock server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, mock_router(state))
        .await
        .context("mock server stopped unexpectedly")
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::agent::message::Conversation;
    use crate::server::canned::WEATHER_REPLY;

    fn router() -> Router {
        mock_router(MockServerState::seeded(Duration::ZERO, Duration::ZERO))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let boundary = "agentchat-boundary";
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{}\r\n", boundary));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n",
                    name, file_name
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", boundary));

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn deleting_a_conversation_removes_it_from_history() {
        let app = router();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/history?id=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Conversation deleted");

        let response = app
            .oneshot(Request::builder().uri("/api/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let history: Vec<Conversation> = serde_json::from_slice(&bytes).unwrap();
        let ids: Vec<&str> = history.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[tokio::test]
    async fn delete_without_id_is_rejected() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Conversation ID is required");
    }

    #[tokio::test]
    async fn chat_answers_weather_questions() {
        let response = router()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                r#"{"message":"What's the weather in London?","conversationId":"2"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["role"], "assistant");
        assert_eq!(body["content"], WEATHER_REPLY);
        assert!(body["id"].is_string());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn malformed_chat_body_is_a_server_error() {
        let response = router()
            .oneshot(json_request("POST", "/api/chat", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Failed to process message");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let response = router()
            .oneshot(multipart_request(&[("note", None, "hello")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No file provided");
    }

    #[tokio::test]
    async fn upload_reports_file_metadata() {
        let response = router()
            .oneshot(multipart_request(&[
                ("note", None, "ignored"),
                ("file", Some("notes.txt"), "twelve bytes"),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["fileName"], "notes.txt");
        assert_eq!(body["size"], 12);
        assert_eq!(body["type"], "text/plain");
        assert_eq!(body["message"], "File notes.txt uploaded successfully");
    }

    #[tokio::test]
    async fn agent_endpoints_validate_the_query() {
        let response = router()
            .oneshot(json_request("POST", "/crypto", r#"{"query":"   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["detail"].is_string());

        let long = "a".repeat(1001);
        let response = router()
            .oneshot(json_request(
                "POST",
                "/law",
                &format!(r#"{{"query":"{}"}}"#, long),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn agent_endpoint_returns_the_response_envelope() {
        let response = router()
            .oneshot(json_request(
                "POST",
                "/city-info",
                r#"{"query":"What is the population of Tokyo?"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert!(body["result"]["content"].as_str().unwrap().contains("population"));
        assert_eq!(body["result"]["usage"]["prompt_tokens"], 6);
    }
}
