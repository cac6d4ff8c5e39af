//! Service trait definitions for dependency injection
//!
//! All calls to the hosted assistant API go through this trait so the chat
//! flow and the analytics agents can be tested without a network.

use async_trait::async_trait;

use crate::error::AssistantResult;
use crate::types::{ListMessages, Run, ThreadMessage};

/// Hosted assistant API client
#[mockall::automock]
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Create an empty conversation thread and return its id
    async fn create_thread(&self) -> AssistantResult<String>;

    /// Append a user message to a thread
    async fn add_user_message(&self, thread_id: &str, content: &str) -> AssistantResult<()>;

    /// Start a run of `assistant_id` on the thread and wait until it settles
    async fn create_and_poll_run(&self, thread_id: &str, assistant_id: &str) -> AssistantResult<Run>;

    /// List messages of a thread
    async fn list_messages(&self, thread_id: &str, query: ListMessages) -> AssistantResult<Vec<ThreadMessage>>;
}
