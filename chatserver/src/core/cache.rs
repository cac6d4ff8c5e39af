//! Short-lived correlation cache for background analytics
//!
//! Each chat reply gets a [`MessageId`]. The entry is created pending before
//! the analytics agents start, filled once when they finish, and read by the
//! widget's polling endpoint. Entries disappear shortly after their first
//! delivery, or after the TTL if nobody ever polls.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use shared::{AnalyticsPoll, ComponentId, MessageId, component_debug};

/// Timing knobs of the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entries older than this are removed by the sweeper
    pub entry_ttl: Duration,
    /// How often the sweeper runs
    pub sweep_interval: Duration,
    /// How long a delivered entry stays readable
    pub delivered_grace: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
            delivered_grace: Duration::from_secs(10),
        }
    }
}

/// Analytics results for one chat reply
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub interaction: Option<Value>,
    pub analytics: Option<Value>,
    pub ready: bool,
    pub delivered: bool,
    pub timestamp: Instant,
}

impl CacheEntry {
    fn pending() -> Self {
        Self {
            interaction: None,
            analytics: None,
            ready: false,
            delivered: false,
            timestamp: Instant::now(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnalyticsCache {
    entries: Arc<RwLock<HashMap<MessageId, CacheEntry>>>,
    config: CacheConfig,
}

impl AnalyticsCache {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Register a reply whose analytics are still being computed
    pub async fn insert_pending(&self, id: &MessageId) {
        self.entries.write().await.insert(id.clone(), CacheEntry::pending());
    }

    /// Mark an entry ready without analytics (agents not configured)
    pub async fn mark_ready(&self, id: &MessageId) {
        if let Some(entry) = self.entries.write().await.get_mut(id) {
            entry.ready = true;
        }
    }

    /// Store the background result; recreates the entry if it was swept meanwhile
    pub async fn complete(&self, id: &MessageId, interaction: Option<Value>, analytics: Option<Value>) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(id.clone()).or_insert_with(CacheEntry::pending);
        entry.interaction = interaction;
        entry.analytics = analytics;
        entry.ready = true;
        entry.timestamp = Instant::now();
    }

    /// Read the analytics of a reply
    ///
    /// Reads share the lock; only the first successful read takes the write
    /// lock, to mark the entry delivered and schedule its removal after the
    /// delivered grace period.
    pub async fn poll(&self, id: &MessageId) -> AnalyticsPoll {
        let (result, delivered) = {
            let entries = self.entries.read().await;
            match entries.get(id) {
                Some(entry) if entry.ready => (
                    AnalyticsPoll::ready(entry.interaction.clone(), entry.analytics.clone()),
                    entry.delivered,
                ),
                _ => return AnalyticsPoll::pending(),
            }
        };
        if delivered {
            return result;
        }

        let first_delivery = match self.entries.write().await.get_mut(id) {
            Some(entry) if !entry.delivered => {
                entry.delivered = true;
                true
            }
            _ => false,
        };

        if first_delivery {
            self.schedule_removal(id.clone());
        }
        result
    }

    fn schedule_removal(&self, id: MessageId) {
        let entries = Arc::clone(&self.entries);
        let grace = self.config.delivered_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            entries.write().await.remove(&id);
            component_debug!(ComponentId::current(), "Removed delivered analytics {}", id);
        });
    }

    /// Remove entries older than the TTL, returning how many were dropped
    pub async fn sweep(&self) -> usize {
        let ttl = self.config.entry_ttl;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.timestamp.elapsed() <= ttl);
        before - entries.len()
    }

    /// Run [`sweep`](Self::sweep) every sweep interval until the task is aborted
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cache.config.sweep_interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep().await;
                if removed > 0 {
                    component_debug!(ComponentId::current(), "Swept {} expired analytics entries", removed);
                }
            }
        })
    }

    pub async fn get(&self, id: &MessageId) -> Option<CacheEntry> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for AnalyticsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fast_config() -> CacheConfig {
        CacheConfig {
            entry_ttl: Duration::from_millis(50),
            sweep_interval: Duration::from_millis(20),
            delivered_grace: Duration::from_millis(40),
        }
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_ready() {
        let cache = AnalyticsCache::new();
        let poll = cache.poll(&MessageId::from("msg_missing")).await;
        assert_eq!(poll, AnalyticsPoll::pending());
    }

    #[tokio::test]
    async fn test_pending_entry_is_not_ready() {
        let cache = AnalyticsCache::new();
        let id = MessageId::generate();
        cache.insert_pending(&id).await;

        let poll = cache.poll(&id).await;
        assert!(!poll.ready);
        assert_eq!(poll.interaction, None);

        // A not-ready read must not count as delivery
        assert!(!cache.get(&id).await.unwrap().delivered);
    }

    #[tokio::test]
    async fn test_completed_entry_is_delivered() {
        let cache = AnalyticsCache::new();
        let id = MessageId::generate();
        cache.insert_pending(&id).await;
        cache
            .complete(&id, Some(json!({ "event": "chatbot_interaction" })), Some(json!({ "event": "donation_interest" })))
            .await;

        let poll = cache.poll(&id).await;
        assert!(poll.ready);
        assert_eq!(poll.interaction, Some(json!({ "event": "chatbot_interaction" })));
        assert_eq!(poll.analytics, Some(json!({ "event": "donation_interest" })));
        assert!(cache.get(&id).await.unwrap().delivered);
    }

    #[tokio::test]
    async fn test_pending_reads_run_concurrently() {
        let cache = AnalyticsCache::new();
        let id = MessageId::generate();
        cache.insert_pending(&id).await;

        // A held read guard must not block pollers
        let guard = cache.entries.read().await;
        let pending = tokio::time::timeout(Duration::from_millis(200), cache.poll(&id)).await;
        let missing = tokio::time::timeout(Duration::from_millis(200), cache.poll(&MessageId::from("msg_missing"))).await;
        drop(guard);

        assert_eq!(pending.unwrap(), AnalyticsPoll::pending());
        assert_eq!(missing.unwrap(), AnalyticsPoll::pending());
    }

    #[tokio::test]
    async fn test_delivery_is_marked_once() {
        let cache = AnalyticsCache::new();
        let id = MessageId::generate();
        cache.complete(&id, Some(json!({ "event": "chatbot_interaction" })), None).await;

        let first = cache.poll(&id).await;
        let second = cache.poll(&id).await;
        assert_eq!(first, second);
        assert!(cache.get(&id).await.unwrap().delivered);
    }

    #[tokio::test]
    async fn test_mark_ready_without_analytics() {
        let cache = AnalyticsCache::new();
        let id = MessageId::generate();
        cache.insert_pending(&id).await;
        cache.mark_ready(&id).await;

        assert_eq!(cache.poll(&id).await, AnalyticsPoll::ready(None, None));
    }

    #[tokio::test]
    async fn test_complete_recreates_swept_entry() {
        let cache = AnalyticsCache::new();
        let id = MessageId::generate();
        cache.complete(&id, None, Some(json!({ "event": "contact_request" }))).await;

        let poll = cache.poll(&id).await;
        assert!(poll.ready);
        assert_eq!(poll.analytics, Some(json!({ "event": "contact_request" })));
    }

    #[tokio::test]
    async fn test_delivered_entry_is_removed_after_grace() {
        let cache = AnalyticsCache::with_config(fast_config());
        let id = MessageId::generate();
        cache.insert_pending(&id).await;
        cache.complete(&id, Some(json!({ "a": 1 })), None).await;

        assert!(cache.poll(&id).await.ready);
        // Still readable during the grace period
        assert!(cache.poll(&id).await.ready);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.is_empty().await);
        assert!(!cache.poll(&id).await.ready);
    }

    #[tokio::test]
    async fn test_sweep_drops_only_expired_entries() {
        let cache = AnalyticsCache::with_config(fast_config());
        let old = MessageId::from("msg_old");
        cache.insert_pending(&old).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        let fresh = MessageId::from("msg_fresh");
        cache.insert_pending(&fresh).await;

        assert_eq!(cache.sweep().await, 1);
        assert!(cache.get(&old).await.is_none());
        assert!(cache.get(&fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_sweeper_task_evicts_in_background() {
        let cache = AnalyticsCache::with_config(fast_config());
        let handle = cache.spawn_sweeper();
        cache.insert_pending(&MessageId::from("msg_stale")).await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.len().await, 0);
        handle.abort();
    }
}
