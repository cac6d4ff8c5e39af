//! Widget trait definitions for dependency injection

use async_trait::async_trait;
use serde_json::Value;

use shared::{AnalyticsPoll, ChatReply, ChatRequest, HealthStatus, MessageId};

use crate::core::InfoCard;
use crate::error::WidgetResult;
use crate::types::Role;

/// HTTP seam towards the chat server
#[mockall::automock]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /api/chat`
    async fn send_chat(&self, request: ChatRequest) -> WidgetResult<ChatReply>;

    /// `GET /api/chat/analytics/{messageId}`
    async fn fetch_analytics(&self, message_id: &MessageId) -> WidgetResult<AnalyticsPoll>;

    /// `GET /api/health`
    async fn health(&self) -> WidgetResult<HealthStatus>;
}

/// Sink for tag-manager style events
#[mockall::automock]
pub trait DataLayer: Send + Sync {
    fn push(&self, event: Value);
}

/// Where the transcript is rendered
#[mockall::automock]
pub trait ChatView: Send + Sync {
    fn show_message(&self, role: Role, text: &str);

    fn show_cards(&self, cards: &[InfoCard]);

    fn show_typing(&self, typing: bool);

    fn show_quick_actions(&self, visible: bool);

    /// Drop everything rendered so far
    fn clear(&self);
}
