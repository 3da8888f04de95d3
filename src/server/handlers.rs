use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Local;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::agent::config::AgentVariant;
use crate::agent::message::{Conversation, Message};
use crate::agent::providers::{ApiResponse, HealthResponse, QueryRequest};

use super::MockServerState;
use super::canned;

const MAX_QUERY_CHARS: usize = 1000;

/// Handler failures, rendered as JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    /// Agent endpoint validation failures use a `detail` field.
    #[error("{0}")]
    InvalidQuery(String),
    #[error("{0}")]
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::InvalidQuery(detail) => {
                (StatusCode::BAD_REQUEST, json!({ "detail": detail }))
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_name: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub content_type: String,
    pub message: String,
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

/// POST /api/chat
pub async fn chat(
    State(state): State<MockServerState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(request) = body.map_err(|e| {
        error!("Error in chat API: {}", e);
        ApiError::Internal("Failed to process message")
    })?;
    debug!(
        "chat message for conversation {:?}",
        request.conversation_id.as_deref().unwrap_or("-")
    );

    simulate_latency(state.chat_latency).await;
    let reply = canned::reply_for(&request.message, Local::now());
    Ok(Json(Message::assistant(reply)))
}

/// GET /api/history
pub async fn list_history(
    State(state): State<MockServerState>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let conversations = state.repository.list().await.map_err(|e| {
        error!("Error in history API: {}", e);
        ApiError::Internal("Failed to fetch history")
    })?;
    Ok(Json(conversations))
}

/// DELETE /api/history?id=<id>
pub async fn delete_history(
    State(state): State<MockServerState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::BadRequest("Conversation ID is required"))?;

    let removed = state.repository.delete(&id).await.map_err(|e| {
        error!("Error in delete history API: {}", e);
        ApiError::Internal("Failed to delete conversation")
    })?;
    if removed {
        info!("Deleted conversation {}", id);
    } else {
        debug!("Delete for unknown conversation {}", id);
    }

    Ok(Json(DeleteResponse {
        success: true,
        message: String::from("Conversation deleted"),
    }))
}

/// POST /api/upload (multipart field `file`)
pub async fn upload(
    State(state): State<MockServerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Upload without a multipart body: {}", e);
        ApiError::BadRequest("No file provided")
    })?;

    let upload_failed = |e: axum::extract::multipart::MultipartError| {
        error!("Error in upload API: {}", e);
        ApiError::Internal("Failed to upload file")
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_failed)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(upload_failed)?;

        simulate_latency(state.upload_latency).await;
        info!("Accepted upload {} ({} bytes)", file_name, bytes.len());
        return Ok(Json(UploadResponse {
            success: true,
            message: format!("File {} uploaded successfully", file_name),
            file_name,
            size: bytes.len(),
            content_type,
        }));
    }

    Err(ApiError::BadRequest("No file provided"))
}

fn validate_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidQuery(String::from(
            "Query cannot be empty or whitespace only",
        )));
    }
    if trimmed.chars().count() > MAX_QUERY_CHARS {
        return Err(ApiError::InvalidQuery(format!(
            "Query is too long. Please keep it under {} characters.",
            MAX_QUERY_CHARS
        )));
    }
    Ok(trimmed)
}

async fn run_agent(
    state: MockServerState,
    variant: AgentVariant,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let query = validate_query(&request.query)?;
    let preview: String = query.chars().take(100).collect();
    info!("Running agent '{}' with query: {}", variant.slug(), preview);

    simulate_latency(state.chat_latency).await;
    let content = canned::reply_for(query, Local::now());
    let usage = canned::estimate_usage(query, &content);
    Ok(Json(ApiResponse::success(content, Some(usage))))
}

/// POST /city-info
pub async fn city_info(
    State(state): State<MockServerState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    run_agent(state, AgentVariant::CityInfo, body).await
}

/// POST /crypto
pub async fn crypto(
    State(state): State<MockServerState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    run_agent(state, AgentVariant::Crypto, body).await
}

/// POST /law
pub async fn law(
    State(state): State<MockServerState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    run_agent(state, AgentVariant::Law, body).await
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("healthy"),
        available_agents: AgentVariant::ALL
            .iter()
            .map(|variant| variant.slug().to_string())
            .collect(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}
