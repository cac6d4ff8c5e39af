//! Chat server entry point

use anyhow::Context;
use clap::Parser;
use tokio::signal;

use chatserver::{Args, ChatServer, RealAssistantClient, ServerConfig, core::AnalyticsCache};
use shared::{ComponentId, component_info, component_warn, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let args = Args::parse();

    ComponentId::init_chatserver();
    logging::init_tracing(&args.log_level).context("Failed to initialize logging")?;
    if !dotenv_loaded {
        component_info!(ComponentId::current(), "No .env file found, using process environment");
    }

    let config = ServerConfig::from_args(args)?;

    if !config.assistants.assistant_configured() {
        component_warn!(ComponentId::current(), "⚠️ ASSISTANT_ID not configured, /api/chat will answer 500");
    }
    if !config.assistants.analytics_configured() {
        component_info!(ComponentId::current(), "Analytics assistants not configured, replies are marked ready immediately");
    }

    let assistant = RealAssistantClient::new(config.client.clone())?;
    let server = ChatServer::new(config.bind_address, config.assistants, assistant, AnalyticsCache::new())
        .with_static_dir(config.static_dir);

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => {
                component_info!(ComponentId::current(), "🛑 Received Ctrl+C, shutting down");
            }
            Err(err) => {
                component_warn!(ComponentId::current(), "Signal handling failed: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    server.run(shutdown).await?;

    component_info!(ComponentId::current(), "✅ Chat server stopped gracefully");
    Ok(())
}
