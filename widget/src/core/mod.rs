//! Widget core logic

pub mod info_card;
pub mod poller;
pub mod quick_action;

pub use info_card::InfoCard;
pub use poller::{AnalyticsPoller, PollOutcome, PollerConfig};
pub use quick_action::QuickAction;
