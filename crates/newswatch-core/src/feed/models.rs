use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Source name used when a feed does not carry a title
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// A candidate article produced by the fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Article URL, empty when the entry has no link
    pub link: String,
    /// Publish time; fetch time when the entry has no parseable timestamp
    pub published_at: DateTime<Utc>,
    /// Plain-text summary or description
    pub summary: Option<String>,
    /// Feed title or search engine label
    pub source: String,
}

impl Article {
    /// Text the keyword matcher searches: "{title} {summary}"
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.summary.as_deref().unwrap_or(""))
    }
}

/// Where a category pulls candidate articles from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// RSS/Atom feed URL
    Feed(String),
    /// Free-text web search query
    Query(String),
    /// NewsAPI `everything` query
    NewsApi(String),
}

impl Source {
    pub fn describe(&self) -> &str {
        match self {
            Source::Feed(url) => url,
            Source::Query(query) | Source::NewsApi(query) => query,
        }
    }
}

/// Per-cycle fetch bounds
#[derive(Debug, Clone, Copy)]
pub struct FetchWindow {
    /// Time the scan started; default timestamp for undated entries
    pub now: DateTime<Utc>,
    /// Entries published before this are dropped
    pub cutoff: DateTime<Utc>,
    /// Maximum entries taken from each source
    pub max_entries: usize,
}

impl FetchWindow {
    pub fn new(now: DateTime<Utc>, hours_back: u32, max_entries: usize) -> Self {
        Self {
            now,
            cutoff: now - Duration::hours(i64::from(hours_back)),
            max_entries,
        }
    }

    /// Keep the first `max_entries` articles that are not older than the cutoff
    pub fn apply(&self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .take(self.max_entries)
            .filter(|a| a.published_at >= self.cutoff)
            .collect()
    }
}
