//! Per-session persistence of the conversation
//!
//! Mirrors browser session storage: a flat string map saved as one JSON
//! file. The message list is stored JSON-encoded under its own key so a
//! damaged list never takes the ids down with it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shared::{ComponentId, component_debug, component_error, component_warn};

use crate::error::{WidgetError, WidgetResult};
use crate::types::StoredMessage;

pub const CONVERSATION_ID_KEY: &str = "tck_conversation_id";
pub const THREAD_ID_KEY: &str = "tck_thread_id";
pub const MESSAGES_KEY: &str = "tck_chat_messages";

/// Key/value session storage, optionally backed by a file
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

pub fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl SessionStore {
    /// Storage that lives as long as the process
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Load the session file at `path`
    ///
    /// A missing file starts an empty session. An unreadable one is logged
    /// and replaced on the next write.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                component_warn!(ComponentId::current(), "Ignoring damaged session file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                component_warn!(ComponentId::current(), "Cannot read session file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: String) -> WidgetResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value);
        })
    }

    pub fn remove(&self, key: &str) -> WidgetResult<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> WidgetResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| WidgetError::storage("session store lock poisoned"))?;
        change(&mut entries);

        if let Some(path) = &self.path {
            let bytes = serde_json::to_vec_pretty(&*entries)?;
            std::fs::write(path, bytes)
                .map_err(|e| WidgetError::storage(format!("cannot write {}: {e}", path.display())))?;
        }
        Ok(())
    }

    /// The stored conversation id, creating and storing one if absent
    pub fn get_or_create_conversation_id(&self) -> WidgetResult<String> {
        if let Some(id) = self.get(CONVERSATION_ID_KEY).filter(|id| !id.is_empty()) {
            return Ok(id);
        }
        self.reset_conversation_id()
    }

    /// Store and return a fresh conversation id
    pub fn reset_conversation_id(&self) -> WidgetResult<String> {
        let id = new_conversation_id();
        self.set(CONVERSATION_ID_KEY, id.clone())?;
        component_debug!(ComponentId::current(), "New conversation {}", id);
        Ok(id)
    }

    pub fn thread_id(&self) -> Option<String> {
        self.get(THREAD_ID_KEY).filter(|id| !id.is_empty())
    }

    /// Store the thread id; empty ids are ignored
    pub fn set_thread_id(&self, thread_id: &str) -> WidgetResult<()> {
        if thread_id.is_empty() {
            return Ok(());
        }
        self.set(THREAD_ID_KEY, thread_id.to_string())
    }

    pub fn clear_thread_id(&self) -> WidgetResult<()> {
        self.remove(THREAD_ID_KEY)
    }

    /// The saved transcript; empty when missing or damaged
    pub fn stored_messages(&self) -> Vec<StoredMessage> {
        self.get(MESSAGES_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Save the transcript; failures are logged and swallowed
    pub fn save_messages(&self, messages: &[StoredMessage]) {
        let result = serde_json::to_string(messages)
            .map_err(WidgetError::from)
            .and_then(|raw| self.set(MESSAGES_KEY, raw));
        if let Err(e) = result {
            component_error!(ComponentId::current(), "Error saving messages: {}", e);
        }
    }

    pub fn clear_messages(&self) -> WidgetResult<()> {
        self.remove(MESSAGES_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversation_id_is_stable_until_reset() {
        let store = SessionStore::in_memory();
        let first = store.get_or_create_conversation_id().unwrap();
        assert!(uuid::Uuid::parse_str(&first).is_ok());
        assert_eq!(store.get_or_create_conversation_id().unwrap(), first);

        let second = store.reset_conversation_id().unwrap();
        assert_ne!(first, second);
        assert_eq!(store.get_or_create_conversation_id().unwrap(), second);
    }

    #[test]
    fn test_empty_thread_id_is_ignored() {
        let store = SessionStore::in_memory();
        store.set_thread_id("thread_1").unwrap();
        store.set_thread_id("").unwrap();
        assert_eq!(store.thread_id(), Some("thread_1".to_string()));

        store.clear_thread_id().unwrap();
        assert_eq!(store.thread_id(), None);
    }

    #[test]
    fn test_messages_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(&path);
        let messages = vec![
            StoredMessage::user("Hola"),
            StoredMessage::assistant("¡Hola!", Some(json!({ "title": "Agua" }))),
        ];
        store.save_messages(&messages);
        store.set_thread_id("thread_9").unwrap();

        let reopened = SessionStore::open(&path);
        assert_eq!(reopened.stored_messages(), messages);
        assert_eq!(reopened.thread_id(), Some("thread_9".to_string()));
    }

    #[test]
    fn test_damaged_message_list_reads_as_empty() {
        let store = SessionStore::in_memory();
        store.set(MESSAGES_KEY, "[{not json".to_string()).unwrap();
        store.set_thread_id("thread_1").unwrap();

        assert!(store.stored_messages().is_empty());
        assert_eq!(store.thread_id(), Some("thread_1".to_string()));
    }

    #[test]
    fn test_damaged_file_starts_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = SessionStore::open(&path);
        assert!(store.stored_messages().is_empty());
        assert_eq!(store.thread_id(), None);
    }

    #[test]
    fn test_clear_messages() {
        let store = SessionStore::in_memory();
        store.save_messages(&[StoredMessage::user("Hola")]);
        store.clear_messages().unwrap();
        assert!(store.stored_messages().is_empty());
    }

    #[test]
    fn test_unwritable_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be written as a file
        let store = SessionStore::open(dir.path());

        assert!(matches!(store.set_thread_id("thread_1"), Err(WidgetError::Storage { .. })));
        // save_messages swallows the same failure
        store.save_messages(&[StoredMessage::user("Hola")]);
    }
}
