//! Test helper utilities for chat server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::ServiceExt;

use chatserver::types::{ListMessages, Run, RunStatus, ThreadMessage};
use chatserver::{AssistantClient, AssistantResult};

pub const MAIN_ASSISTANT: &str = "asst_main";
pub const INTERACTION_ASSISTANT: &str = "asst_interaction";
pub const FUNNEL_ASSISTANT: &str = "asst_funnel";

pub fn test_address() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

/// Assistant fake answering per assistant id, with slow analytics runs
pub struct ScriptedAssistant {
    pub main_reply: String,
    pub interaction_reply: String,
    pub funnel_reply: String,
    pub agent_delay: Duration,
    thread_counter: AtomicUsize,
    runs: Mutex<HashMap<String, String>>,
    pub posted: Mutex<Vec<(String, String)>>,
}

impl ScriptedAssistant {
    pub fn new(main_reply: &str) -> Self {
        Self {
            main_reply: main_reply.to_string(),
            interaction_reply: json!({ "event": "chatbot_interaction", "intent": "donar" }).to_string(),
            funnel_reply: json!({ "event": "donation_interest" }).to_string(),
            agent_delay: Duration::from_millis(0),
            thread_counter: AtomicUsize::new(0),
            runs: Mutex::new(HashMap::new()),
            posted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_agent_delay(mut self, delay: Duration) -> Self {
        self.agent_delay = delay;
        self
    }

    pub fn with_funnel_reply(mut self, reply: &str) -> Self {
        self.funnel_reply = reply.to_string();
        self
    }

    pub fn threads_created(&self) -> usize {
        self.thread_counter.load(Ordering::SeqCst)
    }
}

fn text_message(role: &str, text: &str) -> ThreadMessage {
    serde_json::from_value(json!({
        "id": format!("msg_{role}"),
        "role": role,
        "content": [{ "type": "text", "text": { "value": text, "annotations": [] } }]
    }))
    .unwrap()
}

#[async_trait]
impl AssistantClient for ScriptedAssistant {
    async fn create_thread(&self) -> AssistantResult<String> {
        let n = self.thread_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread_{n}"))
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> AssistantResult<()> {
        self.posted
            .lock()
            .unwrap()
            .push((thread_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn create_and_poll_run(&self, thread_id: &str, assistant_id: &str) -> AssistantResult<Run> {
        if assistant_id != MAIN_ASSISTANT {
            tokio::time::sleep(self.agent_delay).await;
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
        let reply = match assistant.as_str() {
            INTERACTION_ASSISTANT => &self.interaction_reply,
            FUNNEL_ASSISTANT => &self.funnel_reply,
            _ => &self.main_reply,
        };
        Ok(vec![text_message("assistant", reply), text_message("user", "hola")])
    }
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Send one request through the router and decode the body as JSON
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Helper to wait for async conditions with timeout
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if condition().await {
            return true;
        }

        if start.elapsed() > timeout {
            return false;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
