//! Client side of the donation chat
//!
//! Keeps the visitor's conversation across restarts, sends messages to the
//! chat server, renders replies and info cards, and forwards background
//! analytics to a data layer.

pub mod core;
pub mod error;
pub mod services;
pub mod session;
pub mod state;
pub mod traits;
pub mod types;
pub mod widget_impl;

// Re-export main types
pub use error::{WidgetError, WidgetResult};
pub use session::SessionStore;
pub use types::*;
pub use widget_impl::{ChatWidget, ReplyView, SendOutcome};

// Re-export trait definitions
pub use traits::{ChatApi, ChatView, DataLayer};

// Re-export service implementations
pub use services::{ChatApiClient, RecordingDataLayer, TerminalView, TracingDataLayer};
