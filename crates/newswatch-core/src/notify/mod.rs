mod message;
mod telegram;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::matcher::MatchedArticle;

pub use message::{format_alert, MessageStyle, MAX_ALERT_ARTICLES};
pub use telegram::TelegramNotifier;

/// Delivers an alert summary of matched articles
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one alert for `matches`. Returns whether the message was
    /// delivered; failures are logged, never propagated.
    async fn notify(&self, matches: &[MatchedArticle], scan_time: DateTime<Local>) -> bool;
}
