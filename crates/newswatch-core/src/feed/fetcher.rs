use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Proxy};
use url::Url;

use super::models::{Article, FetchWindow, Source};
use super::newsapi::NewsApiClient;
use super::parser::parse_feed;
use super::search::SearchScraper;
use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

// Rotating User-Agent pool; search pages reject non-browser agents
static USER_AGENT_INDEX: AtomicUsize = AtomicUsize::new(0);
const USER_AGENTS: &[&str] = &[
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Get the next User-Agent in rotation
fn next_user_agent() -> &'static str {
    let index = USER_AGENT_INDEX.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
    USER_AGENTS[index]
}

/// Build HTTP client with optional proxy
pub(crate) fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(ref proxy) = proxy_url {
        let proxy = Proxy::all(proxy)
            .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
        builder = builder.proxy(proxy);
        tracing::info!("Using HTTP proxy for fetching");
    }

    builder.build().map_err(Error::Http)
}

/// Build browser-like headers for a request
fn build_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,application/rss+xml,application/atom+xml,*/*;q=0.8"
        )
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-AU,en;q=0.9")
    );
    if let Ok(ua) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, ua);
    }
    headers
}

/// GET a URL once and return its body, rejecting non-2xx and oversized responses
pub(crate) async fn fetch_body(client: &Client, url: &str) -> Result<Bytes> {
    let user_agent = next_user_agent();
    tracing::debug!("GET {} (User-Agent: {})", url, user_agent);

    let response = client
        .get(url)
        .headers(build_headers(user_agent))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
    }

    let body = response.bytes().await?;
    if body.len() > MAX_BODY_BYTES {
        return Err(Error::FeedParse(format!(
            "Response too large ({} bytes) for URL: {}",
            body.len(),
            url
        )));
    }

    Ok(body)
}

/// Fetches candidate articles for a list of sources
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Fetch every source in order. Failing sources are logged and skipped.
    async fn fetch(&self, sources: &[Source], window: &FetchWindow) -> Vec<Article>;
}

/// RSS/Atom feed fetcher
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch one feed and return its recent entries
    pub async fn fetch(&self, url: &str, window: &FetchWindow) -> Result<Vec<Article>> {
        Url::parse(url)?;

        tracing::info!("Fetching feed from: {}", url);

        let content = fetch_body(&self.client, url).await?;
        let parsed = parse_feed(&content, window.now)?;

        Ok(window.apply(parsed.articles))
    }
}

/// Feed, web search and NewsAPI fetcher used by the scan pipeline
pub struct NewsFetcher {
    feeds: FeedFetcher,
    search: SearchScraper,
    newsapi: NewsApiClient,
}

impl NewsFetcher {
    /// Create a fetcher with one shared HTTP client built from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = build_client(config.sync.request_timeout_secs, &config.sync.proxy_url)?;

        Ok(Self {
            feeds: FeedFetcher::new(client.clone()),
            search: SearchScraper::new(client.clone(), &config.search),
            newsapi: NewsApiClient::new(client, &config.newsapi),
        })
    }

    async fn fetch_source(&self, source: &Source, window: &FetchWindow) -> Result<Vec<Article>> {
        match source {
            Source::Feed(url) => self.feeds.fetch(url, window).await,
            Source::Query(query) => self.search.search(query, window).await,
            Source::NewsApi(query) => self.newsapi.search(query, window).await,
        }
    }
}

#[async_trait]
impl ArticleFetcher for NewsFetcher {
    async fn fetch(&self, sources: &[Source], window: &FetchWindow) -> Vec<Article> {
        let mut articles = Vec::new();

        for source in sources {
            match self.fetch_source(source, window).await {
                Ok(found) => {
                    tracing::info!("Source '{}': {} recent articles", source.describe(), found.len());
                    articles.extend(found);
                }
                Err(e) => {
                    tracing::error!("Error fetching from {}: {}", source.describe(), e);
                }
            }
        }

        articles
    }
}
