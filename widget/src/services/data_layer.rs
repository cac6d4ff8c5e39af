//! Data layer sinks for widget events

use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

use shared::json::spread;
use shared::{ComponentId, component_info};

use crate::traits::DataLayer;

/// Push `{event: name, ...data}` to the sink, if one is installed
pub fn push_event(layer: Option<&dyn DataLayer>, name: &str, data: Value) {
    let Some(layer) = layer else {
        return;
    };

    let mut event = Map::new();
    event.insert("event".to_string(), Value::String(name.to_string()));
    layer.push(Value::Object(spread(event, &data)));
}

/// Keeps every event in memory
#[derive(Clone, Debug, Default)]
pub struct RecordingDataLayer {
    events: Arc<Mutex<Vec<Value>>>,
}

impl RecordingDataLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Value> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Events whose `event` field equals `name`
    pub fn events_named(&self, name: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|event| event.get("event").and_then(Value::as_str) == Some(name))
            .collect()
    }
}

impl DataLayer for RecordingDataLayer {
    fn push(&self, event: Value) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Emits each event as a log line
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDataLayer;

impl DataLayer for TracingDataLayer {
    fn push(&self, event: Value) {
        let name = event.get("event").and_then(Value::as_str).unwrap_or("(unnamed)").to_string();
        component_info!(ComponentId::current(), "📊 dataLayer {} {}", name, event);
    }
}
