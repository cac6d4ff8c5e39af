//! ChatServer-specific error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use shared::ErrorBody;
use thiserror::Error;

use crate::types::RunStatus;

/// Failures talking to the hosted assistant API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssistantError {
    #[error("Assistant API rejected the credentials")]
    Unauthorized,

    #[error("Assistant API rate limit exceeded")]
    RateLimited,

    #[error("Assistant API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from assistant API: {0}")]
    InvalidResponse(String),

    #[error("Invalid request to assistant API: {0}")]
    InvalidRequest(String),

    #[error("Run {run_id} did not finish within {waited_secs}s")]
    RunTimeout { run_id: String, waited_secs: u64 },
}

pub type AssistantResult<T> = Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum ChatServerError {
    #[error("Request is missing the user message")]
    MissingMessage,

    #[error("Invalid request format: {details}")]
    InvalidRequest { details: String },

    #[error("Main assistant id is not configured")]
    AssistantNotConfigured,

    #[error("Assistant run ended with status {status}")]
    RunNotCompleted { status: RunStatus },

    #[error("Assistant API error: {0}")]
    Assistant(#[from] AssistantError),

    #[error("Analytics agent returned unusable output: {0}")]
    AgentOutput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server startup error: {0}")]
    ServerStartup(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ChatServerError {
    pub fn config(message: impl Into<String>) -> Self {
        ChatServerError::Config(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatServerError::MissingMessage | ChatServerError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the widget; internal details stay in the logs
    pub fn public_message(&self) -> &'static str {
        match self {
            ChatServerError::MissingMessage => "Falta el mensaje",
            ChatServerError::InvalidRequest { .. } => "Solicitud inválida",
            ChatServerError::AssistantNotConfigured => "Configuración del servidor incompleta",
            _ => "Error interno del servidor",
        }
    }
}

impl IntoResponse for ChatServerError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message().to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

pub type ChatServerResult<T> = Result<T, ChatServerError>;
