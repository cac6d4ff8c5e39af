//! Core identifiers used by both components

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Global component singleton - set once at startup
static COMPONENT_ID: OnceLock<ComponentId> = OnceLock::new();

/// Alphabet of the random message id suffix
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random message id suffix
const MESSAGE_ID_SUFFIX_LEN: usize = 9;

/// Identifies which binary emitted a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    /// HTTP server proxying to the assistant API
    ChatServer,
    /// Chat widget client
    Widget,
    /// Library use without an initialized binary (tests, embedding)
    Embedded,
}

impl ComponentId {
    /// Initialize the global component id for the chat server
    pub fn init_chatserver() -> &'static ComponentId {
        COMPONENT_ID.get_or_init(|| ComponentId::ChatServer)
    }

    /// Initialize the global component id for the widget
    pub fn init_widget() -> &'static ComponentId {
        COMPONENT_ID.get_or_init(|| ComponentId::Widget)
    }

    /// Get the global component id, `Embedded` until a binary sets it
    pub fn current() -> &'static ComponentId {
        COMPONENT_ID.get().unwrap_or(&ComponentId::Embedded)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::ChatServer => write!(f, "chatserver"),
            ComponentId::Widget => write!(f, "widget"),
            ComponentId::Embedded => write!(f, "embedded"),
        }
    }
}

/// Correlates a chat reply with its background analytics
///
/// Format: `msg_<unix millis>_<9 base-36 chars>`. Ids coming back from
/// clients are treated as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh id from the current time and a random suffix
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..MESSAGE_ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("msg_{millis}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_format() {
        let id = MessageId::generate();
        let parts: Vec<&str> = id.as_str().splitn(3, '_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "msg");
        assert!(parts[1].parse::<i64>().is_ok(), "timestamp part should be numeric");
        assert_eq!(parts[2].len(), MESSAGE_ID_SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_message_ids_are_unique() {
        let id1 = MessageId::generate();
        let id2 = MessageId::generate();
        assert_ne!(id1, id2, "Message IDs should be unique");
    }

    #[test]
    fn test_message_id_serializes_as_plain_string() {
        let id = MessageId::from("msg_1_abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"msg_1_abc\"");
    }

    #[test]
    fn test_component_defaults_to_embedded() {
        // Tests never call init_*, so the fallback is visible here
        assert_eq!(ComponentId::current().to_string(), "embedded");
    }
}
