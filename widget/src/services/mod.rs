//! Service implementations
//!
//! Real implementations of the widget's I/O traits

pub mod api_client;
pub mod data_layer;
pub mod terminal_view;

#[cfg(test)]
mod tests;

// Re-export service implementations
pub use api_client::{ChatApiClient, DEFAULT_SERVER_URL};
pub use data_layer::{push_event, RecordingDataLayer, TracingDataLayer};
pub use terminal_view::TerminalView;
