//! HTTP client for the chat server API

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use shared::json::is_truthy;
use shared::{AnalyticsPoll, ChatReply, ChatRequest, ComponentId, HealthStatus, MessageId, component_debug};

use crate::error::{WidgetError, WidgetResult};
use crate::traits::ChatApi;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3001";

/// Reqwest-backed [`ChatApi`]
#[derive(Clone, Debug)]
pub struct ChatApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ChatApiClient {
    /// Create a client for `server_url`; a bare `host:port` gets `http://`
    pub fn new(server_url: &str) -> WidgetResult<Self> {
        Self::with_timeout(server_url, Duration::from_secs(90))
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> WidgetResult<Self> {
        let trimmed = server_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(WidgetError::Config {
                message: "Server URL must not be empty".to_string(),
            });
        }
        let base_url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read a body as JSON, whatever the status
    async fn read_json(response: Response) -> WidgetResult<(StatusCode, Value)> {
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes)
            .map_err(|e| WidgetError::InvalidResponse(format!("{status}: {e}")))?;
        Ok((status, body))
    }

    fn decode<T: DeserializeOwned>(body: Value) -> WidgetResult<T> {
        serde_json::from_value(body).map_err(|e| WidgetError::InvalidResponse(e.to_string()))
    }
}

/// The message the server attached to a failed request
fn error_message(status: StatusCode, body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(other) if is_truthy(other) => other.to_string(),
        _ => format!("Error {}", status.as_u16()),
    }
}

#[async_trait]
impl ChatApi for ChatApiClient {
    async fn send_chat(&self, request: ChatRequest) -> WidgetResult<ChatReply> {
        let response = self.client.post(self.url("/api/chat")).json(&request).send().await?;
        let (status, body) = Self::read_json(response).await?;

        // A 2xx carrying an `error` field is still a failure
        if !status.is_success() || body.get("error").is_some_and(is_truthy) {
            return Err(WidgetError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        Self::decode(body)
    }

    async fn fetch_analytics(&self, message_id: &MessageId) -> WidgetResult<AnalyticsPoll> {
        let url = self.url(&format!("/api/chat/analytics/{message_id}"));
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            component_debug!(ComponentId::current(), "Analytics poll for {} returned {}", message_id, status);
            return Err(WidgetError::Api {
                status: status.as_u16(),
                message: format!("Error {}", status.as_u16()),
            });
        }

        Ok(response.json().await?)
    }

    async fn health(&self) -> WidgetResult<HealthStatus> {
        let response = self.client.get(self.url("/api/health")).send().await?;
        let (status, body) = Self::read_json(response).await?;
        if !status.is_success() {
            return Err(WidgetError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Self::decode(body)
    }
}
