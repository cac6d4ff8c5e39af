//! Chat server state management

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crate::core::AnalyticsCache;
use crate::types::AssistantIds;

/// Core chat server state
#[derive(Debug)]
pub struct ChatServerState {
    pub bind_address: SocketAddr,
    pub assistants: AssistantIds,

    // Pending and finished background analytics
    pub analytics_cache: AnalyticsCache,

    pub is_running: AtomicBool,
    pub chats_served: AtomicU64,
    pub server_start_time: Instant,
}

impl ChatServerState {
    pub fn new(bind_address: SocketAddr, assistants: AssistantIds, analytics_cache: AnalyticsCache) -> Self {
        Self {
            bind_address,
            assistants,
            analytics_cache,
            is_running: AtomicBool::new(true),
            chats_served: AtomicU64::new(0),
            server_start_time: Instant::now(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub fn set_running(&self, running: bool) {
        self.is_running.store(running, Ordering::Relaxed);
    }

    /// Count a served chat turn, returning the new total
    pub fn record_chat(&self) -> u64 {
        self.chats_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.server_start_time.elapsed().as_secs()
    }
}
