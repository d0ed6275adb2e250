//! Client for the SOIA chat service
//!
//! The session controller only talks to [`ChatApi`]; [`ChatClient`] is the
//! HTTP implementation used by the front ends. Every way a call can go wrong
//! ends up as an [`ApiError`], and the controller treats all of them alike.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const CHAT_PATH: &str = "/api/v1/chat";
const HEALTH_PATH: &str = "/health";
const MAX_DETAIL_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub message: String,
    /// Retrieval sources the service cited. Only logged.
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u32>,
}

impl ChatResponse {
    pub fn new(conversation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message: message.into(),
            sources: Vec::new(),
            model: None,
            tokens_used: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("chat service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat service returned status {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("malformed chat response: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// One outbound chat call per invocation.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse, ApiError>;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the service's health endpoint.
    pub async fn health(&self) -> Result<bool, ApiError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let body = response.text().await?;
        let health: HealthResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(health.status == "healthy")
    }
}

#[async_trait]
impl ChatApi for ChatClient {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
        let url = format!("{}{}", self.base_url, CHAT_PATH);
        tracing::debug!(
            %url,
            conversation_id = ?request.conversation_id,
            "sending chat request"
        );

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let body = response.text().await?;
        let chat: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        tracing::debug!(
            conversation_id = %chat.conversation_id,
            model = ?chat.model,
            tokens_used = ?chat.tokens_used,
            sources = chat.sources.len(),
            "chat response received"
        );
        Ok(chat)
    }
}

/// Pull a human-readable reason out of an error body.
///
/// The service answers errors with either `{"detail": ...}` or
/// `{"error": true, "message": ...}`; anything else is kept as raw text.
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let detail = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(s)),
            ..
        }) => s,
        Ok(ErrorBody {
            detail: Some(other),
            ..
        }) => other.to_string(),
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => body.to_string(),
    };

    Some(detail.chars().take(MAX_DETAIL_CHARS).collect())
}
