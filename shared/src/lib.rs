//! Shared types for the donation chat system
//!
//! Contains only what the chat server and the widget both need:
//! the JSON messages exchanged over HTTP, component identity and
//! logging setup. Assistant API types stay inside the server.

pub mod errors;
pub mod json;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

// Re-export the HTTP messages
pub use messages::{AnalyticsPoll, ChatReply, ChatRequest, ErrorBody, HealthStatus};
