//! Assistant API types
//!
//! Only the fields the chat server reads are modelled; everything else in
//! the API payloads is ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Thread object returned by `POST /threads`
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run will not change status any more without client action
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Run object returned by the runs endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
}

impl Run {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Author of a thread message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Text payload of a content block
#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub value: String,
}

/// A single content block of a message
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

/// Message stored in a thread
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Text of the first content block, if that block is text
    pub fn first_text(&self) -> Option<&str> {
        match self.content.first() {
            Some(MessageContent::Text { text }) => Some(text.value.as_str()),
            _ => None,
        }
    }
}

/// Page wrapper of `GET /threads/{id}/messages`
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    pub data: Vec<ThreadMessage>,
}

/// Sort order of message listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query for listing thread messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListMessages {
    pub order: SortOrder,
    pub limit: Option<u32>,
}

impl ListMessages {
    /// Newest messages first, at most `limit`
    pub fn newest(limit: u32) -> Self {
        Self {
            order: SortOrder::Desc,
            limit: Some(limit),
        }
    }
}

/// Assistant ids the server was configured with
///
/// Empty strings count as not configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantIds {
    pub main: Option<String>,
    pub interaction: Option<String>,
    pub analytics: Option<String>,
}

impl AssistantIds {
    pub fn new(main: Option<String>, interaction: Option<String>, analytics: Option<String>) -> Self {
        let configured = |id: Option<String>| id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            main: configured(main),
            interaction: configured(interaction),
            analytics: configured(analytics),
        }
    }

    pub fn assistant_configured(&self) -> bool {
        self.main.is_some()
    }

    /// Both analytics agents are needed for background enrichment
    pub fn analytics_configured(&self) -> bool {
        self.interaction.is_some() && self.analytics.is_some()
    }
}
