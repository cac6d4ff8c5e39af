//! Background polling for a reply's analytics
//!
//! After each reply the widget asks the server, at a fixed interval and up
//! to an attempt cap, whether the analytics agents have finished. Ready
//! results are forwarded to the data layer tagged with the conversation id.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use shared::json::{is_truthy, spread};
use shared::{AnalyticsPoll, ComponentId, MessageId, component_debug};

use crate::traits::{ChatApi, DataLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Wait before the first request
    pub initial_delay: Duration,
    /// Wait between attempts
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(800),
            interval: Duration::from_millis(500),
            max_attempts: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Analytics arrived; `pushed` events reached the data layer
    Delivered { attempts: u32, pushed: usize },
    /// The cap was reached without a ready answer
    Exhausted { attempts: u32 },
}

pub struct AnalyticsPoller<C: ChatApi> {
    api: Arc<C>,
    data_layer: Option<Arc<dyn DataLayer>>,
    config: PollerConfig,
}

impl<C: ChatApi> Clone for AnalyticsPoller<C> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            data_layer: self.data_layer.clone(),
            config: self.config,
        }
    }
}

impl<C: ChatApi + 'static> AnalyticsPoller<C> {
    pub fn new(api: Arc<C>, data_layer: Option<Arc<dyn DataLayer>>, config: PollerConfig) -> Self {
        Self {
            api,
            data_layer,
            config,
        }
    }

    pub fn config(&self) -> PollerConfig {
        self.config
    }

    /// Poll until the analytics are ready or the attempts run out
    ///
    /// Failed requests and not-ready answers are retried alike.
    pub async fn poll(&self, message_id: &MessageId, conversation_id: &str) -> PollOutcome {
        tokio::time::sleep(self.config.initial_delay).await;

        for attempt in 1..=self.config.max_attempts {
            match self.api.fetch_analytics(message_id).await {
                Ok(poll) if poll.ready => {
                    let pushed = self.deliver(&poll, conversation_id);
                    component_debug!(
                        ComponentId::current(),
                        "Analytics for {} delivered after {} attempt(s)",
                        message_id,
                        attempt
                    );
                    return PollOutcome::Delivered { attempts: attempt, pushed };
                }
                Ok(_) => {}
                Err(e) => {
                    component_debug!(ComponentId::current(), "Analytics poll {} failed: {}", attempt, e);
                }
            }

            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        component_debug!(ComponentId::current(), "Gave up waiting for analytics of {}", message_id);
        PollOutcome::Exhausted {
            attempts: self.config.max_attempts,
        }
    }

    /// Fire-and-forget variant of [`poll`](Self::poll)
    pub fn spawn(&self, message_id: MessageId, conversation_id: String) -> JoinHandle<PollOutcome> {
        let poller = self.clone();
        tokio::spawn(async move { poller.poll(&message_id, &conversation_id).await })
    }

    /// Push the interaction and any funnel event to the data layer
    fn deliver(&self, poll: &AnalyticsPoll, conversation_id: &str) -> usize {
        let Some(layer) = &self.data_layer else {
            return 0;
        };

        let interaction = poll.interaction.as_ref().filter(|value| is_truthy(value));
        let funnel = poll
            .analytics
            .as_ref()
            .filter(|value| value.get("event").is_some_and(is_truthy));

        let mut pushed = 0;
        for payload in interaction.into_iter().chain(funnel) {
            let mut event = spread(Map::new(), payload);
            event.insert("conversation_id".to_string(), Value::String(conversation_id.to_string()));
            layer.push(Value::Object(event));
            pushed += 1;
        }
        pushed
    }
}
