use chrono::{DateTime, Utc};
use feed_rs::parser;

use super::models::{Article, UNKNOWN_SOURCE};
use crate::{Error, Result};

/// Parsed feed data from RSS/Atom content
#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub articles: Vec<Article>,
}

/// Parse RSS/Atom feed content into articles in document order.
///
/// Entries without a usable publish or update time are stamped with
/// `fetched_at`, so they always count as fresh.
pub fn parse_feed(content: &[u8], fetched_at: DateTime<Utc>) -> Result<ParsedFeed> {
    let feed = parser::parse(content)
        .map_err(|e| Error::FeedParse(e.to_string()))?;

    let title = feed.title.map(|t| t.content);
    let source = title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    let articles = feed.entries.into_iter().map(|entry| {
        let link = entry.links.first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        let title = entry.title
            .map(|t| html_to_text(&t.content))
            .unwrap_or_default();

        let summary = entry.summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .map(|s| html_to_text(&s))
            .filter(|s| !s.is_empty());

        let published_at = entry.published
            .or(entry.updated)
            .map(|dt| DateTime::<Utc>::from(dt))
            .unwrap_or(fetched_at);

        Article {
            title,
            link,
            published_at,
            summary,
            source: source.clone(),
        }
    }).collect();

    Ok(ParsedFeed { title, articles })
}

/// Convert HTML content to plain text
fn html_to_text(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return html.trim().to_string();
    }
    html2text::from_read(html.as_bytes(), 200)
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|_| html.to_string())
}
