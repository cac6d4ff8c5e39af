//! Turning raw assistant output into a widget reply

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use shared::json::is_truthy;

use crate::types::{MessageRole, ThreadMessage};

/// Shown when the assistant produced nothing usable
pub const FALLBACK_REPLY: &str = "Lo siento, hubo un error de comunicación.";

/// Reply text plus optional structured card data
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedReply {
    pub reply: String,
    pub donation_details: Option<Value>,
}

fn markdown_image() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[.*?\]\(.*?\)").expect("valid markdown image pattern"))
}

fn excess_newlines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid newline pattern"))
}

/// Drop every ```json and ``` marker and trim
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse assistant text that may be wrapped in a markdown code fence
pub fn parse_fenced_json(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(raw))
}

/// Newest assistant message in a newest-first listing
pub fn latest_assistant_text(messages: &[ThreadMessage]) -> Option<&str> {
    messages
        .iter()
        .find(|m| m.role == MessageRole::Assistant)
        .and_then(ThreadMessage::first_text)
}

/// Build the reply from the assistant's raw text
///
/// Structured output `{"response": ..., "donationDetails": ...}` is unpacked;
/// anything else is used verbatim. Markdown images are removed since the
/// widget renders plain text.
pub fn extract_reply(raw: &str) -> ExtractedReply {
    let (text, donation_details) = match parse_fenced_json(raw) {
        Ok(Value::Object(fields)) => {
            let text = match fields.get("response") {
                Some(Value::String(response)) if !response.is_empty() => response.clone(),
                _ => raw.to_string(),
            };
            let details = fields.get("donationDetails").filter(|d| is_truthy(d)).cloned();
            (text, details)
        }
        _ => (raw.to_string(), None),
    };

    let without_images = markdown_image().replace_all(&text, "");
    let reply = excess_newlines()
        .replace_all(without_images.trim(), "\n\n")
        .into_owned();

    ExtractedReply {
        reply,
        donation_details,
    }
}

/// Reply for a thread listing, falling back when no assistant text exists
pub fn reply_from_messages(messages: &[ThreadMessage]) -> ExtractedReply {
    match latest_assistant_text(messages) {
        Some(raw) => extract_reply(raw),
        None => ExtractedReply {
            reply: FALLBACK_REPLY.to_string(),
            donation_details: None,
        },
    }
}
