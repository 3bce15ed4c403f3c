//! NewsAPI `everything` search
//!
//! Keyed source: without an API key every query returns no articles.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::models::{Article, FetchWindow, UNKNOWN_SOURCE};
use crate::config::NewsApiConfig;
use crate::{Error, Result};

/// NewsAPI caps `pageSize` at 100
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    description: Option<String>,
    source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

impl NewsApiArticle {
    fn into_article(self, fetched_at: DateTime<Utc>) -> Article {
        let published_at = self
            .published_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(fetched_at);

        Article {
            title: self.title.unwrap_or_default(),
            link: self.url.unwrap_or_default(),
            published_at,
            summary: self.description.filter(|d| !d.trim().is_empty()),
            source: self
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        }
    }
}

pub struct NewsApiClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    language: String,
}

impl NewsApiClient {
    pub fn new(client: Client, config: &NewsApiConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        }
    }

    /// Newest articles for `query` published since the window cutoff
    pub async fn search(&self, query: &str, window: &FetchWindow) -> Result<Vec<Article>> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("NEWSAPI_KEY not set, skipping NewsAPI query '{}'", query);
            return Ok(Vec::new());
        };

        tracing::info!("Querying NewsAPI for '{}'", query);

        let page_size = window.max_entries.clamp(1, MAX_PAGE_SIZE).to_string();
        let from = window.cutoff.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(format!("{}/everything", self.api_base))
            .header("X-Api-Key", api_key)
            .query(&[
                ("q", query),
                ("language", self.language.as_str()),
                ("sortBy", "publishedAt"),
                ("from", from.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: EverythingResponse = serde_json::from_str(&body)
            .map_err(|e| Error::FeedParse(format!("NewsAPI HTTP {}: {}", status, e)))?;

        if !status.is_success() || parsed.status != "ok" {
            return Err(Error::FeedParse(format!(
                "NewsAPI HTTP {}: {}",
                status,
                parsed.message.unwrap_or(parsed.status)
            )));
        }

        let articles = parsed
            .articles
            .into_iter()
            .map(|a| a.into_article(window.now))
            .collect();

        Ok(window.apply(articles))
    }
}
