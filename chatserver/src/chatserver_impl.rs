//! Main chat server implementation
//!
//! The ChatServer owns the assistant client, the analytics agents and the
//! shared state, and exposes them through an axum router.

use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
    routing::{get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use shared::{
    AnalyticsPoll, ChatReply, ChatRequest, ComponentId, HealthStatus, MessageId, component_error, component_info,
};

use crate::core::{AnalyticsAgents, AnalyticsCache, Exchange, reply_from_messages};
use crate::error::{ChatServerError, ChatServerResult};
use crate::state::ChatServerState;
use crate::traits::AssistantClient;
use crate::types::{AssistantIds, ListMessages};

/// How many recent thread messages are scanned for the reply
const REPLY_SCAN_LIMIT: u32 = 10;

/// Main chat server with an injected assistant client
pub struct ChatServer<A: AssistantClient> {
    state: Arc<ChatServerState>,
    assistant: Arc<A>,
    agents: Option<Arc<AnalyticsAgents<A>>>,
    static_dir: Option<PathBuf>,
}

impl<A: AssistantClient> Clone for ChatServer<A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            assistant: Arc::clone(&self.assistant),
            agents: self.agents.clone(),
            static_dir: self.static_dir.clone(),
        }
    }
}

impl<A: AssistantClient + 'static> ChatServer<A> {
    /// Create a new chat server
    ///
    /// Analytics agents are only built when both analytics assistants are
    /// configured.
    pub fn new(bind_address: SocketAddr, assistants: AssistantIds, assistant: A, cache: AnalyticsCache) -> Self {
        let assistant = Arc::new(assistant);
        let agents = match (&assistants.interaction, &assistants.analytics) {
            (Some(interaction), Some(analytics)) => Some(Arc::new(AnalyticsAgents::new(
                Arc::clone(&assistant),
                interaction.clone(),
                analytics.clone(),
            ))),
            _ => None,
        };
        let state = Arc::new(ChatServerState::new(bind_address, assistants, cache));

        Self {
            state,
            assistant,
            agents,
            static_dir: None,
        }
    }

    /// Serve files from `dir` for every path the API does not handle
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Build the Axum router with all routes
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/api/chat", post(chat_handler::<A>))
            .route("/api/chat/analytics/:message_id", get(analytics_handler::<A>))
            .route("/api/health", get(health_handler::<A>));

        let router = match &self.static_dir {
            Some(dir) => router.fallback_service(ServeDir::new(dir)),
            None => router,
        };

        router
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive())
                    .into_inner(),
            )
            .with_state(self.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F) -> ChatServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let bind_address = self.state.bind_address;
        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .map_err(|e| ChatServerError::ServerStartup(format!("Failed to bind to {bind_address}: {e}")))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// The cache sweeper lives exactly as long as the server.
    pub async fn serve<F>(&self, listener: tokio::net::TcpListener, shutdown: F) -> ChatServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let local_address = listener.local_addr()?;

        self.state.set_running(true);
        let sweeper = self.state.analytics_cache.spawn_sweeper();

        component_info!(ComponentId::current(), "🚀 Chat server listening on http://{}", local_address);
        if let Some(dir) = &self.static_dir {
            component_info!(ComponentId::current(), "📁 Serving static files from {}", dir.display());
        }

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        self.state.set_running(false);
        sweeper.abort();
        component_info!(
            ComponentId::current(),
            "🛑 Chat server stopped after {}s ({} chats served)",
            self.state.get_uptime_seconds(),
            self.state.chats_served.load(std::sync::atomic::Ordering::Relaxed)
        );
        result.map_err(ChatServerError::from)
    }

    /// Get server state for external access
    pub fn state(&self) -> &Arc<ChatServerState> {
        &self.state
    }

    /// One chat turn: forward the message, wait for the main assistant and
    /// start background analytics
    pub async fn handle_chat(&self, request: ChatRequest) -> ChatServerResult<ChatReply> {
        let message = request.message_text().ok_or(ChatServerError::MissingMessage)?.to_string();

        let Some(assistant_id) = self.state.assistants.main.clone() else {
            component_error!(ComponentId::current(), "ASSISTANT_ID is not configured");
            return Err(ChatServerError::AssistantNotConfigured);
        };

        let thread_id = match request.existing_thread() {
            Some(thread_id) if !is_valid_thread_id(thread_id) => {
                return Err(ChatServerError::InvalidRequest {
                    details: format!("malformed threadId {thread_id:?}"),
                });
            }
            Some(thread_id) => thread_id.to_string(),
            None => self.assistant.create_thread().await?,
        };

        self.assistant.add_user_message(&thread_id, &message).await?;

        let run = self.assistant.create_and_poll_run(&thread_id, &assistant_id).await?;
        if !run.is_completed() {
            return Err(ChatServerError::RunNotCompleted { status: run.status });
        }

        let messages = self
            .assistant
            .list_messages(&thread_id, ListMessages::newest(REPLY_SCAN_LIMIT))
            .await?;
        let extracted = reply_from_messages(&messages);

        let message_id = MessageId::generate();
        let cache = &self.state.analytics_cache;
        // The entry must exist before the agents can write to it
        cache.insert_pending(&message_id).await;

        match &self.agents {
            Some(agents) => {
                let agents = Arc::clone(agents);
                let cache = cache.clone();
                let id = message_id.clone();
                let exchange = Exchange {
                    user_message: message,
                    bot_reply: extracted.reply.clone(),
                    donation_details: extracted.donation_details.clone(),
                };
                tokio::spawn(async move {
                    agents.run_into_cache(&cache, &id, exchange).await;
                });
            }
            None => cache.mark_ready(&message_id).await,
        }

        let total = self.state.record_chat();
        component_info!(
            ComponentId::current(),
            "💬 Replied on thread {} as {} ({} chats served)",
            thread_id,
            message_id,
            total
        );

        Ok(ChatReply {
            reply: extracted.reply,
            donation_details: extracted.donation_details,
            thread_id,
            message_id: Some(message_id),
        })
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            assistant_configured: self.state.assistants.assistant_configured(),
            analytics_configured: self.state.assistants.analytics_configured(),
        }
    }
}

/// Thread ids handed out by the assistant API are plain `[A-Za-z0-9_-]` tokens
fn is_valid_thread_id(thread_id: &str) -> bool {
    thread_id.len() <= 128
        && thread_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// HTTP Handlers

/// `POST /api/chat`
async fn chat_handler<A: AssistantClient + 'static>(
    State(server): State<ChatServer<A>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ChatServerError> {
    let Json(request) = payload.map_err(|rejection| ChatServerError::InvalidRequest {
        details: rejection.body_text(),
    })?;

    server.handle_chat(request).await.map(Json).map_err(|e| {
        if e.status_code().is_server_error() {
            component_error!(ComponentId::current(), "❌ Chat request failed: {}", e);
        }
        e
    })
}

/// `GET /api/chat/analytics/{messageId}`
async fn analytics_handler<A: AssistantClient + 'static>(
    State(server): State<ChatServer<A>>,
    Path(message_id): Path<String>,
) -> Json<AnalyticsPoll> {
    let poll = server.state.analytics_cache.poll(&MessageId::from(message_id)).await;
    Json(poll)
}

/// `GET /api/health`
async fn health_handler<A: AssistantClient + 'static>(State(server): State<ChatServer<A>>) -> Json<HealthStatus> {
    Json(server.health())
}
