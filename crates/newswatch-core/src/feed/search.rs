//! Web search results scraper
//!
//! Turns a free-text query into candidate articles by scraping the result
//! titles of a search engine page. Results carry no publish time, so they are
//! stamped with the scan time and always count as fresh.

use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::fetcher::fetch_body;
use super::models::{Article, FetchWindow};
use crate::config::SearchConfig;
use crate::{Error, Result};

/// Source name given to search results
pub const SEARCH_SOURCE: &str = "Web Search";

pub struct SearchScraper {
    client: Client,
    url_template: String,
    result_selector: String,
}

impl SearchScraper {
    pub fn new(client: Client, config: &SearchConfig) -> Self {
        Self {
            client,
            url_template: config.url_template.clone(),
            result_selector: config.result_selector.clone(),
        }
    }

    /// Build the search page URL for a query
    pub fn search_url(&self, query: &str) -> String {
        self.url_template
            .replace("{query}", &urlencoding::encode(query))
    }

    /// Run one query and return up to `window.max_entries` results
    pub async fn search(&self, query: &str, window: &FetchWindow) -> Result<Vec<Article>> {
        let url = self.search_url(query);
        tracing::info!("Searching for '{}'", query);

        let body = fetch_body(&self.client, &url).await?;
        let html = String::from_utf8_lossy(&body);

        let results = parse_search_results(&html, &url, &self.result_selector, window.now)?;
        Ok(window.apply(results))
    }
}

/// Extract result titles and links from a search results page.
///
/// The link is the `href` of the closest enclosing `<a>`, or of the first
/// `<a href>` inside the result. Results without a link are skipped.
pub fn parse_search_results(
    html: &str,
    page_url: &str,
    result_selector: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Article>> {
    let selector = Selector::parse(result_selector)
        .map_err(|e| Error::Scrape(format!("Invalid result selector '{}': {}", result_selector, e)))?;
    let inner_link = Selector::parse("a[href]")
        .map_err(|e| Error::Scrape(e.to_string()))?;
    let base = Url::parse(page_url)?;

    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for element in document.select(&selector) {
        let title = element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if title.is_empty() {
            continue;
        }

        let href = enclosing_link(element)
            .or_else(|| element.select(&inner_link).next().and_then(|a| a.value().attr("href")));

        let Some(href) = href else {
            tracing::debug!("Search result without link: {}", title);
            continue;
        };

        let link = match base.join(href) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => href.to_string(),
        };

        articles.push(Article {
            title,
            link,
            published_at: now,
            summary: None,
            source: SEARCH_SOURCE.to_string(),
        });
    }

    Ok(articles)
}

fn enclosing_link(element: ElementRef<'_>) -> Option<&str> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
}
