//! Service implementations
//!
//! Real implementations of all service traits for production use

pub mod assistant_client;

#[cfg(test)]
mod tests;

// Re-export service implementations
pub use assistant_client::{AssistantClientConfig, RealAssistantClient, DEFAULT_BASE_URL};
