//! Shared logging utilities for consistent tracing across both components

use crate::errors::{SharedError, SharedResult};
use crate::types::ComponentId;
use chrono::{DateTime, Utc};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Build the per-component filter directive string
pub fn filter_directives(component: ComponentId, log_level: &str) -> SharedResult<String> {
    let level = log_level.trim().to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(SharedError::InvalidLogLevel {
            level: log_level.to_string(),
        });
    }

    let directives = match component {
        ComponentId::ChatServer => {
            format!("chatserver={level},shared={level},tower_http={level},axum=warn,hyper=warn,reqwest=warn")
        }
        ComponentId::Widget => format!("widget={level},shared={level},reqwest=warn"),
        ComponentId::Embedded => level,
    };
    Ok(directives)
}

/// Initialize the stdout tracing subscriber for the current component
///
/// `RUST_LOG` wins over `log_level` when it is set.
pub fn init_tracing(log_level: &str) -> SharedResult<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let component = *ComponentId::current();
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(filter_directives(component, log_level)?),
    };

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| SharedError::LoggingInit { message: e.to_string() })
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for component-aware debug logging
#[macro_export]
macro_rules! component_debug {
    ($component:expr, $($arg:tt)*) => {
        tracing::debug!(
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for component-aware info logging
#[macro_export]
macro_rules! component_info {
    ($component:expr, $($arg:tt)*) => {
        tracing::info!(
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for component-aware warning logging
#[macro_export]
macro_rules! component_warn {
    ($component:expr, $($arg:tt)*) => {
        tracing::warn!(
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for component-aware error logging
#[macro_export]
macro_rules! component_error {
    ($component:expr, $($arg:tt)*) => {
        tracing::error!(
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}
