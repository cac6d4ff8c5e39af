//! Background analytics agents
//!
//! Two secondary assistants look at every exchange: one describes the
//! interaction, the other detects donation funnel events. They run
//! concurrently after the reply has been sent and never affect it.

use serde_json::Value;
use std::sync::Arc;

use shared::json::is_truthy;
use shared::{ComponentId, MessageId, component_debug, component_warn};

use crate::core::cache::AnalyticsCache;
use crate::core::reply::parse_fenced_json;
use crate::error::{ChatServerError, ChatServerResult};
use crate::traits::AssistantClient;
use crate::types::ListMessages;

/// Funnel events the analytics assistant may report
pub const FUNNEL_EVENTS: [(&str, &str); 5] = [
    ("donation_interest", "Usuario muestra interés en donar"),
    ("donation_info_request", "Usuario pide información sobre cómo donar"),
    ("project_interest", "Usuario pregunta sobre proyectos específicos"),
    ("volunteer_interest", "Usuario pregunta sobre voluntariado"),
    ("contact_request", "Usuario quiere contactar"),
];

/// One user/bot exchange handed to the agents
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user_message: String,
    pub bot_reply: String,
    pub donation_details: Option<Value>,
}

pub fn interaction_prompt(exchange: &Exchange) -> String {
    format!(
        "ANALIZA ESTA INTERACCIÓN EN UNA WEB DE DONACIONES/ONG:\n\
         - Usuario dijo: \"{}\"\n\
         - Chatbot respondió: \"{}\"\n\
         \n\
         Genera el objeto JSON de chatbot_interaction según tus instrucciones.",
        exchange.user_message, exchange.bot_reply
    )
}

pub fn funnel_prompt(exchange: &Exchange) -> String {
    let details = exchange
        .donation_details
        .as_ref()
        .map(Value::to_string)
        .unwrap_or_else(|| "null".to_string());
    let events = FUNNEL_EVENTS
        .iter()
        .map(|(name, description)| format!("- {name}: {description}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "ANALIZA ESTA INTERACCIÓN PARA DETECTAR EVENTOS DE FUNNEL DE DONACIONES:\n\
         \n\
         - Usuario dijo: \"{}\"\n\
         - Chatbot respondió: \"{}\"\n\
         - Detalles de donación (donationDetails): {}\n\
         \n\
         EVENTOS POSIBLES PARA ONG/DONACIONES:\n\
         {}\n\
         \n\
         Si detectas un evento relevante, devuelve el JSON con los datos.\n\
         Si NO hay evento de funnel, devuelve: {{\"event\": null}}",
        exchange.user_message, exchange.bot_reply, details, events
    )
}

/// Runs the interaction and funnel assistants for an exchange
pub struct AnalyticsAgents<A: AssistantClient> {
    client: Arc<A>,
    interaction_assistant: String,
    funnel_assistant: String,
}

impl<A: AssistantClient> AnalyticsAgents<A> {
    pub fn new(client: Arc<A>, interaction_assistant: String, funnel_assistant: String) -> Self {
        Self {
            client,
            interaction_assistant,
            funnel_assistant,
        }
    }

    /// Ask one assistant in a fresh thread and parse its JSON answer
    ///
    /// `Ok(None)` when the run did not complete or the answer is not text.
    async fn ask(&self, assistant_id: &str, prompt: &str) -> ChatServerResult<Option<Value>> {
        let thread_id = self.client.create_thread().await?;
        self.client.add_user_message(&thread_id, prompt).await?;

        let run = self.client.create_and_poll_run(&thread_id, assistant_id).await?;
        if !run.is_completed() {
            component_debug!(ComponentId::current(), "Agent {} run ended with {}", assistant_id, run.status);
            return Ok(None);
        }

        let messages = self.client.list_messages(&thread_id, ListMessages::default()).await?;
        let Some(raw) = messages.first().and_then(|m| m.first_text()) else {
            return Ok(None);
        };

        parse_fenced_json(raw)
            .map(Some)
            .map_err(|e| ChatServerError::AgentOutput(format!("{assistant_id}: {e}")))
    }

    /// Interaction payload, only when the answer is truthy
    pub async fn interaction(&self, exchange: &Exchange) -> ChatServerResult<Option<Value>> {
        let parsed = self.ask(&self.interaction_assistant, &interaction_prompt(exchange)).await?;
        Ok(parsed.filter(is_truthy))
    }

    /// Funnel payload, only when it names an event
    pub async fn funnel(&self, exchange: &Exchange) -> ChatServerResult<Option<Value>> {
        let parsed = self.ask(&self.funnel_assistant, &funnel_prompt(exchange)).await?;
        Ok(parsed.filter(|value| value.get("event").is_some_and(is_truthy)))
    }

    /// Run both agents concurrently; a failure of one does not cancel the other
    pub async fn analyze(&self, exchange: &Exchange) -> (Option<Value>, Option<Value>) {
        let (interaction, funnel) = tokio::join!(self.interaction(exchange), self.funnel(exchange));

        let interaction = interaction.unwrap_or_else(|e| {
            component_warn!(ComponentId::current(), "Interaction agent failed: {}", e);
            None
        });
        let funnel = funnel.unwrap_or_else(|e| {
            component_warn!(ComponentId::current(), "Funnel agent failed: {}", e);
            None
        });
        (interaction, funnel)
    }

    /// Analyze and publish the result under `message_id`
    ///
    /// The entry always ends up ready, with nulls when both agents failed.
    pub async fn run_into_cache(&self, cache: &AnalyticsCache, message_id: &MessageId, exchange: Exchange) {
        let (interaction, analytics) = self.analyze(&exchange).await;
        component_debug!(
            ComponentId::current(),
            "Analytics for {} ready (interaction: {}, funnel event: {})",
            message_id,
            interaction.is_some(),
            analytics.is_some()
        );
        cache.complete(message_id, interaction, analytics).await;
    }
}
