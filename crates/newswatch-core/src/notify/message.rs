use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::config::TelegramConfig;
use crate::matcher::MatchedArticle;

/// Maximum article blocks in one alert message
pub const MAX_ALERT_ARTICLES: usize = 10;

/// Wording of the alert headline
#[derive(Debug, Clone)]
pub struct MessageStyle {
    pub alert_title: String,
    pub topic: String,
}

impl From<&TelegramConfig> for MessageStyle {
    fn from(config: &TelegramConfig) -> Self {
        Self {
            alert_title: config.alert_title.clone(),
            topic: config.topic.clone(),
        }
    }
}

/// Render the alert text for `matches`.
///
/// Shows at most [`MAX_ALERT_ARTICLES`] blocks and notes how many more were
/// found when the list is longer.
pub fn format_alert(matches: &[MatchedArticle], scan_time: DateTime<Local>, style: &MessageStyle) -> String {
    let mut message = format!("🚨 {} Triggered!\n\n", style.alert_title);
    let _ = write!(
        message,
        "Found {} articles with {} keywords:\n\n",
        matches.len(),
        style.topic
    );

    for (i, matched) in matches.iter().take(MAX_ALERT_ARTICLES).enumerate() {
        let article = &matched.article;
        let title = non_empty(&article.title).unwrap_or("No title");
        let link = non_empty(&article.link).unwrap_or("No link");
        let source = non_empty(&article.source).unwrap_or("Unknown");

        let _ = writeln!(message, "{}. {}", i + 1, title);
        let _ = writeln!(message, "   🔑 Keywords: {}", matched.keywords_joined());
        let _ = writeln!(message, "   🔗 {}", link);
        let _ = writeln!(message, "   📰 Source: {}\n", source);
    }

    if matches.len() > MAX_ALERT_ARTICLES {
        let _ = writeln!(message, "... and {} more articles.", matches.len() - MAX_ALERT_ARTICLES);
    }

    let _ = write!(message, "\n⏰ Scan time: {}", scan_time.format("%Y-%m-%d %H:%M:%S"));
    message
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
