//! Service tests for the widget
//!
//! The API client is exercised against a local wiremock server.
