//! Assistant API client over HTTP
//!
//! Talks to the OpenAI Assistants v2 REST API: threads, messages and runs.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::{Duration, Instant};

use shared::{ComponentId, component_debug};

use crate::error::{AssistantError, AssistantResult};
use crate::traits::AssistantClient;
use crate::types::{ListMessages, MessageList, Run, Thread, ThreadMessage};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection and polling settings of the client
#[derive(Debug, Clone)]
pub struct AssistantClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    pub request_timeout: Duration,
}

impl AssistantClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            poll_interval: Duration::from_millis(1000),
            run_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Real assistant client backed by reqwest
#[derive(Clone)]
pub struct RealAssistantClient {
    client: reqwest::Client,
    config: AssistantClientConfig,
}

impl RealAssistantClient {
    pub fn new(config: AssistantClientConfig) -> AssistantResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AssistantError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Join `segments` onto the base URL, percent-encoding each one
    ///
    /// Ids end up as single path segments, so a `/`, `?` or `..` inside a
    /// thread id cannot reach another endpoint.
    fn url(&self, segments: &[&str]) -> AssistantResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.config.base_url)
            .map_err(|e| AssistantError::InvalidRequest(format!("Invalid base URL {}: {e}", self.config.base_url)))?;

        for segment in segments {
            if segment.is_empty() || *segment == "." || *segment == ".." {
                return Err(AssistantError::InvalidRequest(format!("Invalid path segment {segment:?}")));
            }
        }

        url.path_segments_mut()
            .map_err(|_| AssistantError::InvalidRequest(format!("Base URL {} cannot have a path", self.config.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    /// Send the request and decode a successful JSON body
    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> AssistantResult<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| AssistantError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 => AssistantError::Unauthorized,
                429 => AssistantError::RateLimited,
                code => AssistantError::Http {
                    status: code,
                    body: response.text().await.unwrap_or_default(),
                },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AssistantError::InvalidResponse(format!("Failed to parse response: {e}")))
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> AssistantResult<Run> {
        let request = self.client.get(self.url(&["threads", thread_id, "runs", run_id])?);
        self.send_json(request).await
    }
}

#[async_trait]
impl AssistantClient for RealAssistantClient {
    async fn create_thread(&self) -> AssistantResult<String> {
        let request = self.client.post(self.url(&["threads"])?).json(&json!({}));
        let thread: Thread = self.send_json(request).await?;
        component_debug!(ComponentId::current(), "Created thread {}", thread.id);
        Ok(thread.id)
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> AssistantResult<()> {
        let request = self
            .client
            .post(self.url(&["threads", thread_id, "messages"])?)
            .json(&json!({ "role": "user", "content": content }));
        let _: serde_json::Value = self.send_json(request).await?;
        Ok(())
    }

    async fn create_and_poll_run(&self, thread_id: &str, assistant_id: &str) -> AssistantResult<Run> {
        let request = self
            .client
            .post(self.url(&["threads", thread_id, "runs"])?)
            .json(&json!({ "assistant_id": assistant_id }));
        let mut run: Run = self.send_json(request).await?;

        let started = Instant::now();
        while !run.status.is_terminal() {
            if started.elapsed() >= self.config.run_timeout {
                return Err(AssistantError::RunTimeout {
                    run_id: run.id,
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
            run = self.retrieve_run(thread_id, &run.id).await?;
        }

        component_debug!(
            ComponentId::current(),
            "Run {} on thread {} finished with status {} after {}ms",
            run.id,
            thread_id,
            run.status,
            started.elapsed().as_millis()
        );
        Ok(run)
    }

    async fn list_messages(&self, thread_id: &str, query: ListMessages) -> AssistantResult<Vec<ThreadMessage>> {
        let mut params = vec![("order", query.order.as_str().to_string())];
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }

        let request = self
            .client
            .get(self.url(&["threads", thread_id, "messages"])?)
            .query(&params);
        let list: MessageList = self.send_json(request).await?;
        Ok(list.data)
    }
}
