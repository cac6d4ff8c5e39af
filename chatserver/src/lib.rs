//! Chat server library for the donation chat widget
//!
//! Proxies visitor messages to a hosted assistant, answers immediately and
//! enriches each exchange with background analytics that the widget polls.

pub mod chatserver_impl;
pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod state;
pub mod traits;
pub mod types;

// Re-export main types
pub use chatserver_impl::ChatServer;
pub use config::{Args, ServerConfig};
pub use error::{AssistantError, AssistantResult, ChatServerError, ChatServerResult};
pub use state::ChatServerState;
pub use types::*;

// Re-export trait definitions
pub use traits::AssistantClient;

// Re-export service implementations
pub use services::{AssistantClientConfig, RealAssistantClient};
