//! Terminal front-end for the donation chat widget

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use shared::{ComponentId, component_info, component_warn, logging};
use widget::core::{InfoCard, QuickAction};
use widget::services::DEFAULT_SERVER_URL;
use widget::{ChatApiClient, ChatWidget, SendOutcome, SessionStore, TerminalView, TracingDataLayer};

#[derive(Parser, Debug)]
#[command(name = "widget")]
#[command(about = "Terminal client for the donation chat server")]
struct Args {
    /// Chat server base URL
    #[arg(long, env = "CHAT_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// File that keeps the session between runs
    #[arg(long, env = "WIDGET_SESSION_FILE", default_value = ".widget-session.json")]
    session_file: PathBuf,

    /// Keep the session in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

const HELP: &str = "Commands: /open /close /reset /state /donate /projects /volunteer /contact /cta <n> /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    ComponentId::init_widget();
    logging::init_tracing(&args.log_level).context("Failed to initialize logging")?;

    let api = ChatApiClient::new(&args.server_url)?;
    let store = if args.ephemeral {
        SessionStore::in_memory()
    } else {
        SessionStore::open(&args.session_file)
    };

    let widget = ChatWidget::new(api, TerminalView::stdout(), store)?.with_data_layer(Arc::new(TracingDataLayer));

    match widget.check_server().await {
        Ok(health) if !health.assistant_configured => {
            component_warn!(ComponentId::current(), "⚠️ Server at {} has no assistant configured", args.server_url);
        }
        Ok(_) => {
            component_info!(ComponentId::current(), "✅ Connected to {}", args.server_url);
        }
        Err(e) => {
            component_warn!(ComponentId::current(), "Server health check failed: {}", e);
        }
    }

    println!("{HELP}");

    // Cards of the latest reply, for /cta
    let mut last_cards: Vec<InfoCard> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let outcome = match line {
            "/quit" | "/exit" => break,
            "/open" => {
                widget.open().await;
                continue;
            }
            "/close" => {
                widget.close().await;
                continue;
            }
            "/reset" => {
                widget.reset().await?;
                last_cards.clear();
                continue;
            }
            "/state" => {
                println!("{}", serde_json::to_string_pretty(&widget.snapshot().await)?);
                continue;
            }
            "/help" => {
                println!("{HELP}");
                continue;
            }
            command if command.starts_with("/cta") => {
                let index = command.trim_start_matches("/cta").trim().parse::<usize>().unwrap_or(1);
                match index.checked_sub(1).and_then(|i| last_cards.get(i)) {
                    Some(card) => widget.cta_click(card).await,
                    None => println!("No card #{index}"),
                }
                continue;
            }
            command if command.starts_with('/') => match command[1..].parse::<QuickAction>() {
                Ok(action) => widget.quick_action(action).await,
                Err(e) => {
                    println!("{e}. {HELP}");
                    continue;
                }
            },
            text => widget.send(text).await,
        };

        if let SendOutcome::Replied(reply) = outcome {
            last_cards = reply.cards;
        }
    }

    // Let in-flight analytics reach the data layer before exiting
    widget.wait_for_analytics().await;
    Ok(())
}
