//! Widget controller state

use crate::types::{StoredMessage, WidgetSnapshot};

/// Mutable state behind the chat controller
#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    pub sending: bool,
    pub open: bool,
    pub thread_id: Option<String>,
    pub conversation_id: String,
    pub quick_actions_visible: bool,
    pub messages: Vec<StoredMessage>,
    /// Something is on screen, stored or not (the reset status line is not)
    pub transcript_rendered: bool,
}

impl WidgetState {
    pub fn restored(conversation_id: String, thread_id: Option<String>, messages: Vec<StoredMessage>) -> Self {
        Self {
            conversation_id,
            thread_id,
            transcript_rendered: !messages.is_empty(),
            messages,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            sending: self.sending,
            open: self.open,
            thread_id: self.thread_id.clone(),
            conversation_id: self.conversation_id.clone(),
            quick_actions_visible: self.quick_actions_visible,
            message_count: self.messages.len(),
        }
    }
}
