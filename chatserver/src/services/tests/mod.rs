//! Service tests for the chat server
//!
//! The assistant client is exercised against a local wiremock server.
