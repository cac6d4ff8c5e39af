//! End-to-end tests: the widget against a real chat server on localhost
//!
//! The server runs with a scripted assistant so no external API is needed.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chatserver::core::AnalyticsCache;
use chatserver::types::{AssistantIds, ListMessages, Run, RunStatus, ThreadMessage};
use chatserver::{AssistantClient, AssistantResult, ChatServer};
use widget::core::{PollOutcome, PollerConfig};
use widget::{ChatApiClient, ChatWidget, RecordingDataLayer, SendOutcome, SessionStore, TerminalView};

const MAIN: &str = "asst_main";
const INTERACTION: &str = "asst_interaction";
const FUNNEL: &str = "asst_funnel";

/// Answers per assistant id; analytics runs are slow
#[derive(Default)]
struct ScriptedAssistant {
    threads: AtomicUsize,
    runs: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl AssistantClient for ScriptedAssistant {
    async fn create_thread(&self) -> AssistantResult<String> {
        Ok(format!("thread_{}", self.threads.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn add_user_message(&self, _thread_id: &str, _content: &str) -> AssistantResult<()> {
        Ok(())
    }

    async fn create_and_poll_run(&self, thread_id: &str, assistant_id: &str) -> AssistantResult<Run> {
        if assistant_id != MAIN {
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        self.runs
            .lock()
            .unwrap()
            .insert(thread_id.to_string(), assistant_id.to_string());
        Ok(Run {
            id: format!("run_{thread_id}"),
            status: RunStatus::Completed,
        })
    }

    async fn list_messages(&self, thread_id: &str, _query: ListMessages) -> AssistantResult<Vec<ThreadMessage>> {
        let assistant = self.runs.lock().unwrap().get(thread_id).cloned().unwrap_or_default();
        let text = match assistant.as_str() {
            INTERACTION => json!({ "event": "chatbot_interaction", "intent": "donar" }).to_string(),
            FUNNEL => json!({ "event": "donation_interest" }).to_string(),
            _ => json!({
                "response": "Puedes donar desde nuestra web.",
                "donationDetails": { "title": "Agua limpia", "type": "donación", "id": "p-1" }
            })
            .to_string(),
        };
        Ok(vec![serde_json::from_value(json!({
            "id": "msg_reply",
            "role": "assistant",
            "content": [{ "type": "text", "text": { "value": text, "annotations": [] } }]
        }))
        .unwrap()])
    }
}

/// Serve the chat router on an ephemeral port
async fn start_server(assistants: AssistantIds) -> (SocketAddr, Arc<ScriptedAssistant>) {
    let assistant = Arc::new(ScriptedAssistant::default());
    let server = ChatServer::new(
        "127.0.0.1:0".parse().unwrap(),
        assistants,
        SharedAssistant(Arc::clone(&assistant)),
        AnalyticsCache::new(),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = server.build_router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, assistant)
}

/// Lets the test keep a handle on the assistant the server owns
struct SharedAssistant(Arc<ScriptedAssistant>);

#[async_trait]
impl AssistantClient for SharedAssistant {
    async fn create_thread(&self) -> AssistantResult<String> {
        self.0.create_thread().await
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> AssistantResult<()> {
        self.0.add_user_message(thread_id, content).await
    }

    async fn create_and_poll_run(&self, thread_id: &str, assistant_id: &str) -> AssistantResult<Run> {
        self.0.create_and_poll_run(thread_id, assistant_id).await
    }

    async fn list_messages(&self, thread_id: &str, query: ListMessages) -> AssistantResult<Vec<ThreadMessage>> {
        self.0.list_messages(thread_id, query).await
    }
}

fn all_assistants() -> AssistantIds {
    AssistantIds::new(Some(MAIN.into()), Some(INTERACTION.into()), Some(FUNNEL.into()))
}

fn fast_polls() -> PollerConfig {
    PollerConfig {
        initial_delay: Duration::from_millis(10),
        interval: Duration::from_millis(25),
        max_attempts: 40,
    }
}

fn widget_for(
    addr: SocketAddr,
    store: SessionStore,
    layer: &RecordingDataLayer,
) -> ChatWidget<ChatApiClient, TerminalView<Vec<u8>>> {
    let api = ChatApiClient::new(&addr.to_string()).unwrap();
    ChatWidget::new(api, TerminalView::new(Vec::new()), store)
        .unwrap()
        .with_data_layer(Arc::new(layer.clone()))
        .with_poller_config(fast_polls())
}

#[tokio::test]
async fn test_conversation_with_background_analytics() {
    let (addr, _assistant) = start_server(all_assistants()).await;
    let layer = RecordingDataLayer::new();
    let widget = widget_for(addr, SessionStore::in_memory(), &layer);

    widget.open().await;
    let outcome = widget.send("Quiero donar").await;

    let SendOutcome::Replied(reply) = outcome else {
        panic!("expected a reply, got {outcome:?}");
    };
    assert_eq!(reply.reply, "Puedes donar desde nuestra web.");
    assert_eq!(reply.cards.len(), 1);
    assert_eq!(reply.cards[0].title, "Agua limpia");
    assert!(reply.message_id.is_some());

    let outcomes = widget.wait_for_analytics().await;
    assert!(matches!(outcomes[..], [PollOutcome::Delivered { pushed: 2, .. }]));

    let conversation_id = widget.snapshot().await.conversation_id;
    assert_eq!(
        layer.events_named("chatbot_interaction"),
        vec![json!({ "event": "chatbot_interaction", "intent": "donar", "conversation_id": conversation_id })]
    );
    assert_eq!(
        layer.events_named("donation_interest"),
        vec![json!({ "event": "donation_interest", "conversation_id": conversation_id })]
    );

    widget.cta_click(&reply.cards[0]).await;
    let clicks = layer.events_named("chatbot_cta_click");
    assert_eq!(clicks[0]["project_id"], "p-1");
}

#[tokio::test]
async fn test_session_survives_restart_and_reuses_thread() {
    let (addr, assistant) = start_server(all_assistants()).await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    let layer = RecordingDataLayer::new();

    let first = widget_for(addr, SessionStore::open(&session_file), &layer);
    first.open().await;
    first.send("Hola").await;
    first.wait_for_analytics().await;
    let before = first.snapshot().await;
    drop(first);

    let second = widget_for(addr, SessionStore::open(&session_file), &layer);
    let restored = second.snapshot().await;
    assert_eq!(restored.conversation_id, before.conversation_id);
    assert_eq!(restored.thread_id.as_deref(), Some("thread_1"));
    // welcome, question and answer
    assert_eq!(restored.message_count, 3);

    // Reopening a restored transcript shows no second welcome
    second.open().await;
    assert_eq!(second.snapshot().await.message_count, 3);

    second.send("¿Y voluntariado?").await;
    second.wait_for_analytics().await;
    assert_eq!(second.snapshot().await.thread_id.as_deref(), Some("thread_1"));

    // One conversation thread plus two fresh analytics threads per turn
    assert_eq!(assistant.threads.load(Ordering::SeqCst), 1 + 2 * 2);
}

#[tokio::test]
async fn test_unconfigured_server_error_is_shown() {
    let (addr, _assistant) = start_server(AssistantIds::default()).await;
    let layer = RecordingDataLayer::new();
    let widget = widget_for(addr, SessionStore::in_memory(), &layer);

    let outcome = widget.send("Hola").await;
    assert_eq!(
        outcome,
        SendOutcome::ServerError {
            status: 500,
            message: "Configuración del servidor incompleta".into()
        }
    );
    assert_eq!(layer.events_named("chat_error")[0]["status"], 500);
}

#[tokio::test]
async fn test_unreachable_server_is_connection_failure() {
    let layer = RecordingDataLayer::new();
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let widget = widget_for(addr, SessionStore::in_memory(), &layer);

    assert_eq!(widget.send("Hola").await, SendOutcome::ConnectionFailed);
    assert!(!widget.snapshot().await.sending);
    assert_eq!(layer.events_named("chat_error").len(), 1);
}
