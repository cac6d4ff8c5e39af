//! Chat widget controller
//!
//! Owns the conversation state, persists it through the [`SessionStore`],
//! talks to the server through a [`ChatApi`] and renders through a
//! [`ChatView`]. Analytics polling runs in background tasks.

use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use shared::json::is_truthy;
use shared::{
    ChatReply, ChatRequest, ComponentId, HealthStatus, MessageId, component_error, component_info, component_warn,
};

use crate::core::{AnalyticsPoller, InfoCard, PollOutcome, PollerConfig, QuickAction};
use crate::error::{WidgetError, WidgetResult};
use crate::services::push_event;
use crate::session::SessionStore;
use crate::state::WidgetState;
use crate::traits::{ChatApi, ChatView, DataLayer};
use crate::types::{Role, StoredMessage, WidgetSnapshot};

pub const WELCOME_MESSAGE: &str = "¡Hola! 👋 Soy el asistente de TCK ONG. ¿En qué puedo ayudarte hoy?";
pub const NEW_CONVERSATION_MESSAGE: &str = "Nueva conversación iniciada. ¿En qué puedo ayudarte?";
pub const EMPTY_REPLY_MESSAGE: &str = "Lo siento, no pude responder ahora.";
pub const CONNECTION_ERROR_MESSAGE: &str = "Error al conectar con el servidor. Intenta de nuevo.";

/// What a reply looks like to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyView {
    pub reply: String,
    pub cards: Vec<InfoCard>,
    pub message_id: Option<MessageId>,
}

/// Result of one send attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank text, or another message was still in flight
    Ignored,
    Replied(ReplyView),
    /// The server answered with an error message
    ServerError { status: u16, message: String },
    /// The server could not be reached or answered garbage
    ConnectionFailed,
}

pub struct ChatWidget<C: ChatApi, V: ChatView> {
    api: Arc<C>,
    view: Arc<V>,
    store: SessionStore,
    data_layer: Option<Arc<dyn DataLayer>>,
    poller_config: PollerConfig,
    state: RwLock<WidgetState>,
    poll_tasks: Mutex<Vec<JoinHandle<PollOutcome>>>,
}

impl<C: ChatApi + 'static, V: ChatView> ChatWidget<C, V> {
    /// Restore the session from `store` and render any saved transcript
    pub fn new(api: C, view: V, store: SessionStore) -> WidgetResult<Self> {
        let conversation_id = store.get_or_create_conversation_id()?;
        let thread_id = store.thread_id();
        let messages = store.stored_messages();

        for message in &messages {
            view.show_message(message.role, &message.content);
            if let Some(details) = &message.info_card {
                view.show_cards(&InfoCard::cards_from(details));
            }
        }

        Ok(Self {
            api: Arc::new(api),
            view: Arc::new(view),
            store,
            data_layer: None,
            poller_config: PollerConfig::default(),
            state: RwLock::new(WidgetState::restored(conversation_id, thread_id, messages)),
            poll_tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn with_data_layer(mut self, data_layer: Arc<dyn DataLayer>) -> Self {
        self.data_layer = Some(data_layer);
        self
    }

    pub fn with_poller_config(mut self, config: PollerConfig) -> Self {
        self.poller_config = config;
        self
    }

    fn push_event(&self, name: &str, data: Value) {
        push_event(self.data_layer.as_deref(), name, data);
    }

    pub async fn check_server(&self) -> WidgetResult<HealthStatus> {
        self.api.health().await
    }

    /// Open the chat; returns false if it was already open
    pub async fn open(&self) -> bool {
        let (conversation_id, welcome) = {
            let mut state = self.state.write().await;
            if state.open {
                return false;
            }
            state.open = true;

            let welcome = state.messages.is_empty() && !state.transcript_rendered;
            if welcome {
                state.transcript_rendered = true;
                // Stored so it is not repeated on the next open
                state.messages.push(StoredMessage::assistant(WELCOME_MESSAGE, None));
                state.quick_actions_visible = true;
                self.store.save_messages(&state.messages);
            }
            (state.conversation_id.clone(), welcome)
        };

        self.push_event("chat_opened", json!({ "conversation_id": conversation_id }));

        if welcome {
            self.view.show_message(Role::Assistant, WELCOME_MESSAGE);
            self.view.show_quick_actions(true);
        }
        true
    }

    /// Close the chat; returns false if it was already closed
    pub async fn close(&self) -> bool {
        let conversation_id = {
            let mut state = self.state.write().await;
            if !state.open {
                return false;
            }
            state.open = false;
            state.conversation_id.clone()
        };

        self.push_event("chat_closed", json!({ "conversation_id": conversation_id }));
        true
    }

    /// Send one visitor message and render the answer
    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        let (thread_id, conversation_id) = {
            let mut state = self.state.write().await;
            if state.sending {
                return SendOutcome::Ignored;
            }
            state.sending = true;
            state.transcript_rendered = true;
            state.quick_actions_visible = false;
            state.messages.push(StoredMessage::user(text));
            self.store.save_messages(&state.messages);
            (state.thread_id.clone(), state.conversation_id.clone())
        };

        self.view.show_message(Role::User, text);
        self.view.show_quick_actions(false);
        self.view.show_typing(true);

        let request = ChatRequest {
            message: Some(text.to_string()),
            thread_id,
            conversation_id: Some(conversation_id.clone()),
        };
        let result = self.api.send_chat(request).await;
        self.view.show_typing(false);

        let outcome = match result {
            Ok(reply) => self.accept_reply(reply, &conversation_id).await,
            Err(WidgetError::Api { status, message }) => {
                component_warn!(ComponentId::current(), "Chat request rejected ({}): {}", status, message);
                self.view.show_message(Role::Assistant, &format!("Error: {message}"));
                self.push_event(
                    "chat_error",
                    json!({ "status": status, "message": message, "conversation_id": conversation_id }),
                );
                SendOutcome::ServerError { status, message }
            }
            Err(e) => {
                if e.is_connection_failure() {
                    component_warn!(ComponentId::current(), "Chat server unreachable: {}", e);
                } else {
                    component_error!(ComponentId::current(), "Unexpected chat failure: {}", e);
                }
                self.view.show_message(Role::Assistant, CONNECTION_ERROR_MESSAGE);
                self.push_event(
                    "chat_error",
                    json!({ "message": e.to_string(), "conversation_id": conversation_id }),
                );
                SendOutcome::ConnectionFailed
            }
        };

        self.state.write().await.sending = false;
        outcome
    }

    async fn accept_reply(&self, reply: ChatReply, conversation_id: &str) -> SendOutcome {
        let text = if reply.reply.is_empty() {
            EMPTY_REPLY_MESSAGE.to_string()
        } else {
            reply.reply
        };
        let details = reply.donation_details.filter(is_truthy);
        let cards = details.as_ref().map(InfoCard::cards_from).unwrap_or_default();

        {
            let mut state = self.state.write().await;
            if !reply.thread_id.is_empty() {
                state.thread_id = Some(reply.thread_id.clone());
                if let Err(e) = self.store.set_thread_id(&reply.thread_id) {
                    component_warn!(ComponentId::current(), "Could not persist thread id: {}", e);
                }
            }
            state.messages.push(StoredMessage::assistant(text.clone(), details));
            self.store.save_messages(&state.messages);
        }

        self.view.show_message(Role::Assistant, &text);
        if !cards.is_empty() {
            self.view.show_cards(&cards);
        }

        if let Some(message_id) = &reply.message_id {
            let poller = AnalyticsPoller::new(Arc::clone(&self.api), self.data_layer.clone(), self.poller_config);
            let handle = poller.spawn(message_id.clone(), conversation_id.to_string());
            if let Ok(mut tasks) = self.poll_tasks.lock() {
                tasks.retain(|task| !task.is_finished());
                tasks.push(handle);
            }
        }

        component_info!(
            ComponentId::current(),
            "💬 Reply on thread {} with {} card(s)",
            reply.thread_id,
            cards.len()
        );

        SendOutcome::Replied(ReplyView {
            reply: text,
            cards,
            message_id: reply.message_id,
        })
    }

    /// Send the canned message of a quick action
    pub async fn quick_action(&self, action: QuickAction) -> SendOutcome {
        if self.state.read().await.sending {
            return SendOutcome::Ignored;
        }
        self.send(action.message()).await
    }

    /// Start a new conversation, forgetting the thread and transcript
    pub async fn reset(&self) -> WidgetResult<String> {
        let conversation_id = self.store.reset_conversation_id()?;
        self.store.clear_thread_id()?;
        self.store.clear_messages()?;

        {
            let mut state = self.state.write().await;
            state.conversation_id = conversation_id.clone();
            state.thread_id = None;
            state.messages.clear();
            // The status line below stays on screen
            state.transcript_rendered = true;
            state.quick_actions_visible = true;
        }

        self.view.clear();
        self.view.show_message(Role::Assistant, NEW_CONVERSATION_MESSAGE);
        self.view.show_quick_actions(true);

        self.push_event("chat_new_conversation", json!({ "conversation_id": conversation_id }));
        Ok(conversation_id)
    }

    /// Record a click on a card's call to action
    pub async fn cta_click(&self, card: &InfoCard) {
        let conversation_id = self.state.read().await.conversation_id.clone();
        let mut data = card.cta_event_data();
        data["conversation_id"] = Value::String(conversation_id);
        self.push_event("chatbot_cta_click", data);
    }

    pub async fn snapshot(&self) -> WidgetSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn messages(&self) -> Vec<StoredMessage> {
        self.state.read().await.messages.clone()
    }

    /// Wait for every analytics poll started so far
    pub async fn wait_for_analytics(&self) -> Vec<PollOutcome> {
        let tasks = match self.poll_tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => return Vec::new(),
        };

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    component_warn!(ComponentId::current(), "Analytics poll task failed: {}", e);
                }
            }
        }
        outcomes
    }
}
