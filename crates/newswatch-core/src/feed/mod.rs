mod fetcher;
mod models;
mod newsapi;
mod parser;
mod search;

pub(crate) use fetcher::build_client;
pub use fetcher::{ArticleFetcher, FeedFetcher, NewsFetcher};
pub use models::{Article, FetchWindow, Source};
pub use newsapi::NewsApiClient;
pub use parser::{parse_feed, ParsedFeed};
pub use search::{parse_search_results, SearchScraper};
