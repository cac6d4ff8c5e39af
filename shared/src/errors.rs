//! Shared error types for the donation chat system

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid log level: {level}")]
    InvalidLogLevel { level: String },

    #[error("Tracing subscriber initialization failed: {message}")]
    LoggingInit { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
