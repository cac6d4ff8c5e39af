//! Core business logic
//!
//! Pure reply processing, the analytics correlation cache and the
//! background agents. No HTTP concerns live here.

pub mod agents;
pub mod cache;
pub mod reply;

pub use agents::{AnalyticsAgents, Exchange};
pub use cache::{AnalyticsCache, CacheConfig, CacheEntry};
pub use reply::{ExtractedReply, extract_reply, reply_from_messages};
