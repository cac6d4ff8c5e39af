//! Command line and environment configuration
//!
//! Every flag falls back to an environment variable, and `main` loads a
//! `.env` file before parsing.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ChatServerError, ChatServerResult};
use crate::services::{AssistantClientConfig, DEFAULT_BASE_URL};
use crate::types::AssistantIds;

#[derive(Parser, Debug, Clone)]
#[command(name = "chatserver")]
#[command(about = "Donation chat server proxying to a hosted assistant")]
pub struct Args {
    /// Port for the HTTP server
    #[arg(long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// API key of the assistant service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Root URL of the assistant API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Assistant answering the visitor
    #[arg(long, env = "ASSISTANT_ID")]
    pub assistant_id: Option<String>,

    /// Assistant describing each interaction
    #[arg(long, env = "ASSISTANT_INTERACTION_ID")]
    pub interaction_assistant_id: Option<String>,

    /// Assistant detecting donation funnel events
    #[arg(long, env = "ASSISTANT_ANALYTICS_ID")]
    pub analytics_assistant_id: Option<String>,

    /// Static files directory (widget assets, landing page)
    #[arg(long, env = "STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Delay between run status checks
    #[arg(long, env = "RUN_POLL_INTERVAL_MS", default_value = "1000")]
    pub run_poll_interval_ms: u64,

    /// Give up on a run after this long
    #[arg(long, env = "RUN_TIMEOUT_SECS", default_value = "120")]
    pub run_timeout_secs: u64,

    /// Timeout of a single HTTP request to the assistant API
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub static_dir: PathBuf,
    pub assistants: AssistantIds,
    pub client: AssistantClientConfig,
}

impl ServerConfig {
    pub fn from_args(args: Args) -> ChatServerResult<Self> {
        let bind_address: SocketAddr = format!("{}:{}", args.host, args.port)
            .parse()
            .map_err(|e| ChatServerError::config(format!("Invalid bind address {}:{}: {}", args.host, args.port, e)))?;

        if args.openai_api_key.trim().is_empty() {
            return Err(ChatServerError::config("OPENAI_API_KEY must not be empty"));
        }
        if args.run_poll_interval_ms == 0 {
            return Err(ChatServerError::config("Run poll interval must be positive"));
        }

        let client = AssistantClientConfig::new(args.openai_api_key.trim())
            .with_base_url(args.openai_base_url)
            .with_poll_interval(Duration::from_millis(args.run_poll_interval_ms))
            .with_run_timeout(Duration::from_secs(args.run_timeout_secs))
            .with_request_timeout(Duration::from_secs(args.request_timeout_secs));

        Ok(Self {
            bind_address,
            static_dir: args.static_dir,
            assistants: AssistantIds::new(
                args.assistant_id,
                args.interaction_assistant_id,
                args.analytics_assistant_id,
            ),
            client,
        })
    }
}
