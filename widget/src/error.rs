//! Widget error types

use thiserror::Error;

/// Result type for widget operations
pub type WidgetResult<T> = Result<T, WidgetError>;

/// Widget error types
#[derive(Error, Debug)]
pub enum WidgetError {
    /// The server answered with a non-2xx status or an `error` field
    #[error("Server error {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a usable response
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response body: {0}")]
    InvalidResponse(String),

    #[error("Unknown quick action: {0}")]
    UnknownQuickAction(String),

    #[error("Session storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl WidgetError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Whether the failure happened before the server could answer
    ///
    /// These are shown to the visitor as a connection problem rather than
    /// as a server message.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidResponse(_))
    }
}

impl From<reqwest::Error> for WidgetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
