//! Widget-side data types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who wrote a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One persisted transcript message
///
/// `infoCard` holds the raw `donationDetails` of the reply so cards can be
/// rebuilt when the session is restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    #[serde(rename = "infoCard", default)]
    pub info_card: Option<Value>,
}

impl StoredMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            info_card: None,
        }
    }

    pub fn assistant(content: impl Into<String>, info_card: Option<Value>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            info_card,
        }
    }
}

/// Debug view of the controller state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSnapshot {
    pub sending: bool,
    pub open: bool,
    pub thread_id: Option<String>,
    pub conversation_id: String,
    pub quick_actions_visible: bool,
    pub message_count: usize,
}
