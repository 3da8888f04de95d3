use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};

use crate::agent::config::AgentVariant;

use super::{AgentBackend, GatewayError};

pub mod models;

use models::{ApiResponse, HealthResponse, QueryRequest};

/// `AgentBackend` 的 HTTP 實作，向代理服務發送單次請求/回應呼叫。
///
/// 連線重用交由 `reqwest::Client` 處理；不設逾時、不重試。
pub struct HttpBackend {
    /// 後端基礎 URL，不含結尾斜線。
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn send_message(
        &self,
        query: &str,
        variant: AgentVariant,
    ) -> Result<ApiResponse, GatewayError> {
        let url = self.url_for(variant.endpoint());
        debug!("POST {} ({} chars)", url, query.chars().count());
        let result = post_query(&self.client, &url, query).await;
        if let Err(err) = &result {
            error!("Error calling {} agent: {}", variant.slug(), err);
        }
        result
    }

    async fn health(&self) -> Result<HealthResponse, GatewayError> {
        let url = self.url_for("/health");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.clone(),
                source,
            })?;
        let response = ensure_success(response)?;
        response.json().await.map_err(GatewayError::Decode)
    }
}

async fn post_query(client: &Client, url: &str, query: &str) -> Result<ApiResponse, GatewayError> {
    let payload = QueryRequest {
        query: query.to_string(),
    };
    let response = client
        .post(url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .json(&payload)
        .send()
        .await
        .map_err(|source| GatewayError::Transport {
            url: url.to_string(),
            source,
        })?;
    let response = ensure_success(response)?;
    let body: ApiResponse = response.json().await.map_err(GatewayError::Decode)?;
    if !body.is_success() {
        return Err(GatewayError::Rejected(body.status));
    }
    Ok(body)
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GatewayError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tokio::net::TcpListener;

    use super::*;
    use crate::server::{MockServerState, mock_router};

    async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn queries_the_endpoint_for_each_variant() {
        let state = MockServerState::seeded(Duration::ZERO, Duration::ZERO);
        let backend = HttpBackend::new(spawn(mock_router(state)).await);

        let response = backend
            .send_message("What is the bitcoin price?", AgentVariant::Crypto)
            .await
            .unwrap();
        assert!(response.is_success());
        assert!(response.result.content.contains("Bitcoin"));
        assert!(response.result.usage.is_some());

        let health = backend.health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.available_agents.len(), 3);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/law",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let backend = HttpBackend::new(spawn(router).await);

        let err = backend
            .send_message("Is this legal?", AgentVariant::Law)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn rejected_envelope_is_an_error() {
        let router = Router::new().route(
            "/city-info",
            post(|| async {
                axum::Json(serde_json::json!({
                    "status": "error",
                    "result": { "content": "" }
                }))
            }),
        );
        let backend = HttpBackend::new(spawn(router).await);

        let err = backend
            .send_message("Weather?", AgentVariant::CityInfo)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(status) if status == "error"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let backend = HttpBackend::new(format!("http://{}", addr));

        let err = backend
            .send_message("hello", AgentVariant::CityInfo)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport { .. }));
    }
}
