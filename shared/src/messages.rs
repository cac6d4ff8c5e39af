//! Widget ↔ ChatServer HTTP messages
//!
//! Field names follow the JSON contract the browser widget already speaks,
//! hence the mix of camelCase and snake_case.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::MessageId;

/// Body of `POST /api/chat`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "threadId", default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    /// The user message, if present and non-empty
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }

    /// The thread to continue, if the client sent a non-empty one
    pub fn existing_thread(&self) -> Option<&str> {
        self.thread_id.as_deref().filter(|t| !t.is_empty())
    }
}

/// Successful answer of `POST /api/chat`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    #[serde(rename = "donationDetails", default)]
    pub donation_details: Option<Value>,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    #[serde(rename = "messageId", default)]
    pub message_id: Option<MessageId>,
}

/// Answer of `GET /api/chat/analytics/{messageId}`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnalyticsPoll {
    pub ready: bool,
    #[serde(default)]
    pub interaction: Option<Value>,
    #[serde(default)]
    pub analytics: Option<Value>,
}

impl AnalyticsPoll {
    /// Nothing available yet
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn ready(interaction: Option<Value>, analytics: Option<Value>) -> Self {
        Self {
            ready: true,
            interaction,
            analytics,
        }
    }
}

/// Answer of `GET /api/health`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(rename = "assistantConfigured")]
    pub assistant_configured: bool,
    #[serde(rename = "analyticsConfigured")]
    pub analytics_configured: bool,
}

/// Error payload returned with any non-2xx status
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}
