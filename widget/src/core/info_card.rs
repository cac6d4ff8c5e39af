//! Info cards built from a reply's `donationDetails`

use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

use shared::json::is_truthy;

pub const DEFAULT_ACTION_TEXT: &str = "Más información";
pub const DEFAULT_ACTION_URL: &str = "#contacto";
pub const DEFAULT_CARD_TYPE: &str = "proyecto";

/// A project, donation or contact suggestion attached to a reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoCard {
    pub id: Option<Value>,
    pub title: String,
    pub description: String,
    pub objective: String,
    pub action_text: String,
    pub action_url: String,
    #[serde(rename = "type")]
    pub card_type: String,
}

/// Non-empty string field, or `None`
fn text_field<'a>(info: &'a Value, key: &str) -> Option<&'a str> {
    info.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

impl InfoCard {
    /// Build a card from one details object
    ///
    /// Returns `None` unless the object carries a non-blank `title` (or
    /// `name`).
    pub fn from_value(info: &Value) -> Option<Self> {
        if !info.is_object() {
            return None;
        }

        let title = text_field(info, "title").or_else(|| text_field(info, "name"))?;
        if title.trim().is_empty() {
            return None;
        }

        Some(Self {
            id: info.get("id").filter(|id| is_truthy(id)).cloned(),
            title: title.to_string(),
            description: text_field(info, "description").unwrap_or_default().to_string(),
            objective: text_field(info, "objective").unwrap_or_default().to_string(),
            action_text: text_field(info, "actionText").unwrap_or(DEFAULT_ACTION_TEXT).to_string(),
            action_url: text_field(info, "actionUrl").unwrap_or(DEFAULT_ACTION_URL).to_string(),
            card_type: text_field(info, "type").unwrap_or(DEFAULT_CARD_TYPE).to_string(),
        })
    }

    /// All valid cards of a `donationDetails` value (array, object or null)
    pub fn cards_from(details: &Value) -> Vec<Self> {
        match details {
            Value::Array(items) => items.iter().filter_map(Self::from_value).collect(),
            Value::Object(_) => Self::from_value(details).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.card_type.as_str() {
            "donación" => "💝",
            "voluntariado" => "🙋",
            "contacto" => "📧",
            "proyecto" => "🌟",
            _ => "📋",
        }
    }

    /// Fields of the `chatbot_cta_click` event, without the conversation id
    pub fn cta_event_data(&self) -> Value {
        json!({
            "cta_type": self.card_type,
            "cta_title": self.title,
            "project_id": self.id.clone().unwrap_or(Value::Null),
        })
    }
}

impl fmt::Display for InfoCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.icon(), self.title)?;
        if !self.description.is_empty() {
            writeln!(f, "   {}", self.description)?;
        }
        if !self.objective.is_empty() {
            writeln!(f, "   Objetivo: {}", self.objective)?;
        }
        write!(f, "   [{}] {}", self.action_text, self.action_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let card = InfoCard::from_value(&json!({ "title": "Agua limpia" })).unwrap();

        assert_eq!(card.title, "Agua limpia");
        assert_eq!(card.description, "");
        assert_eq!(card.objective, "");
        assert_eq!(card.action_text, DEFAULT_ACTION_TEXT);
        assert_eq!(card.action_url, DEFAULT_ACTION_URL);
        assert_eq!(card.card_type, DEFAULT_CARD_TYPE);
        assert_eq!(card.id, None);
        assert_eq!(card.icon(), "🌟");
    }

    #[test]
    fn test_name_is_accepted_as_title() {
        let card = InfoCard::from_value(&json!({ "name": "Comedor", "type": "voluntariado" })).unwrap();
        assert_eq!(card.title, "Comedor");
        assert_eq!(card.icon(), "🙋");
    }

    #[test]
    fn test_blank_or_missing_title_is_rejected() {
        assert!(InfoCard::from_value(&json!({ "title": "   " })).is_none());
        assert!(InfoCard::from_value(&json!({ "title": 42 })).is_none());
        assert!(InfoCard::from_value(&json!({ "description": "sin título" })).is_none());
        assert!(InfoCard::from_value(&json!("Agua")).is_none());
        assert!(InfoCard::from_value(&Value::Null).is_none());
    }

    #[test]
    fn test_icons_by_type() {
        let icon = |t: &str| InfoCard::from_value(&json!({ "title": "x", "type": t })).unwrap().icon();
        assert_eq!(icon("donación"), "💝");
        assert_eq!(icon("contacto"), "📧");
        assert_eq!(icon("evento"), "📋");
    }

    #[test]
    fn test_cards_from_array_skips_invalid_items() {
        let details = json!([
            { "title": "Agua", "type": "donación" },
            { "description": "sin título" },
            { "name": "Escuela" }
        ]);

        let cards = InfoCard::cards_from(&details);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "Agua");
        assert_eq!(cards[1].title, "Escuela");
    }

    #[test]
    fn test_cards_from_single_object_and_null() {
        assert_eq!(InfoCard::cards_from(&json!({ "title": "Agua" })).len(), 1);
        assert!(InfoCard::cards_from(&json!({ "title": "" })).is_empty());
        assert!(InfoCard::cards_from(&Value::Null).is_empty());
    }

    #[test]
    fn test_cta_event_data() {
        let card = InfoCard::from_value(&json!({ "title": "Agua", "type": "donación", "id": "p-7" })).unwrap();
        assert_eq!(
            card.cta_event_data(),
            json!({ "cta_type": "donación", "cta_title": "Agua", "project_id": "p-7" })
        );

        let card = InfoCard::from_value(&json!({ "title": "Agua" })).unwrap();
        assert!(card.cta_event_data()["project_id"].is_null());
    }

    #[test]
    fn test_display_lists_optional_lines() {
        let card = InfoCard::from_value(&json!({
            "title": "Agua",
            "type": "donación",
            "objective": "1000 litros",
            "actionUrl": "/donar"
        }))
        .unwrap();

        let rendered = card.to_string();
        assert!(rendered.starts_with("💝 Agua"));
        assert!(rendered.contains("Objetivo: 1000 litros"));
        assert!(rendered.ends_with("[Más información] /donar"));
    }
}
