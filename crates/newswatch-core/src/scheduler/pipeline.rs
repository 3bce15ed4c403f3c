use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::{AppConfig, CategoryConfig};
use crate::feed::{ArticleFetcher, FetchWindow, NewsFetcher, Source};
use crate::matcher::{match_articles, should_alert, sort_by_score, MatchedArticle};
use crate::notify::{Notifier, TelegramNotifier};
use crate::sheets::{ScanLogEntry, ScanLogger, SheetsLogger};
use crate::Result;

/// Sample matches included in a scan report
pub const MAX_REPORT_MATCHES: usize = 10;

/// Where the pipeline reads its configuration from at the start of each scan
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Re-read from disk every scan; environment credentials applied on top
    File(PathBuf),
    /// Fixed configuration
    Static(Arc<AppConfig>),
}

impl ConfigSource {
    pub fn load(&self) -> Result<AppConfig> {
        match self {
            ConfigSource::File(path) => AppConfig::load_from(path),
            ConfigSource::Static(config) => Ok(config.as_ref().clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    /// Another scan was already running
    Skipped,
    Error,
}

/// Outcome of one scan cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub status: ScanStatus,
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub fetched: usize,
    #[serde(default)]
    pub matched: usize,
    #[serde(default)]
    pub alert_sent: bool,
    #[serde(default)]
    pub logged: bool,
    /// Highest scoring matches, at most [`MAX_REPORT_MATCHES`]
    #[serde(default)]
    pub matches: Vec<MatchedArticle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanReport {
    fn empty(status: ScanStatus, timestamp: DateTime<Local>) -> Self {
        Self {
            status,
            timestamp,
            fetched: 0,
            matched: 0,
            alert_sent: false,
            logged: false,
            matches: Vec::new(),
            error: None,
        }
    }

    pub fn skipped() -> Self {
        Self::empty(ScanStatus::Skipped, Local::now())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::empty(ScanStatus::Error, Local::now())
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ScanStatus::Success
    }
}

/// Releases the running flag when the scan ends, including on panic unwind
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn category_sources(category: &CategoryConfig) -> Vec<Source> {
    category.feeds.iter().cloned().map(Source::Feed)
        .chain(category.queries.iter().cloned().map(Source::Query))
        .chain(category.newsapi_queries.iter().cloned().map(Source::NewsApi))
        .collect()
}

/// The scan pipeline: fetch, match, decide, notify, log.
///
/// Shared by the periodic scheduler and on-demand triggers. Only one scan
/// runs at a time; a trigger that arrives mid-scan gets a `skipped` report.
pub struct ScanPipeline {
    config: ConfigSource,
    fetcher: Option<Arc<dyn ArticleFetcher>>,
    notifier: Option<Arc<dyn Notifier>>,
    logger: Option<Arc<dyn ScanLogger>>,
    running: AtomicBool,
}

impl ScanPipeline {
    pub fn new(config: ConfigSource) -> Self {
        Self {
            config,
            fetcher: None,
            notifier: None,
            logger: None,
            running: AtomicBool::new(false),
        }
    }

    /// Use a fixed fetcher instead of building one from each scan's config
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ArticleFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use a fixed notifier instead of Telegram
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Use a fixed scan logger instead of Google Sheets
    pub fn with_logger(mut self, logger: Arc<dyn ScanLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Load the configuration the next scan would use
    pub fn load_config(&self) -> Result<AppConfig> {
        self.config.load()
    }

    /// Whether a scan is in progress
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one scan. Never fails: errors are folded into the report.
    pub async fn run_once(&self) -> ScanReport {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            warn!("Scan already in progress, skipping");
            return ScanReport::skipped();
        };

        match self.scan().await {
            Ok(report) => report,
            Err(e) => {
                error!("Scan failed: {}", e);
                ScanReport::failed(e.to_string())
            }
        }
    }

    async fn scan(&self) -> Result<ScanReport> {
        let config = self.load_config()?;
        let started = Local::now();
        let window = FetchWindow::new(
            started.with_timezone(&Utc),
            config.hours_back,
            config.max_entries_per_source,
        );

        let fetcher: Arc<dyn ArticleFetcher> = match self.fetcher {
            Some(ref fetcher) => fetcher.clone(),
            None => Arc::new(NewsFetcher::new(&config)?),
        };
        let notifier: Arc<dyn Notifier> = match self.notifier {
            Some(ref notifier) => notifier.clone(),
            None => Arc::new(TelegramNotifier::new(&config.telegram)?),
        };
        let logger: Arc<dyn ScanLogger> = match self.logger {
            Some(ref logger) => logger.clone(),
            None => Arc::new(SheetsLogger::new(&config.sheets, config.sync.request_timeout_secs)?),
        };

        info!("Starting scan of {} categories", config.categories.len());

        let mut fetched = 0;
        let mut matched = Vec::new();

        for category in &config.categories {
            let sources = category_sources(category);
            let articles = fetcher.fetch(&sources, &window).await;
            fetched += articles.len();

            let keywords = category.effective_keywords(&config.alert_keywords);
            let found = match_articles(articles, keywords, &category.name);

            info!(
                "Category '{}' ({}): {} matches",
                category.name, category.signal_type, found.len()
            );
            matched.extend(found);
        }

        sort_by_score(&mut matched);

        let alert_sent = if should_alert(matched.len(), config.alert_threshold) {
            notifier.notify(&matched, started).await
        } else {
            info!(
                "{} matches below alert threshold {}, no alert sent",
                matched.len(),
                config.alert_threshold
            );
            false
        };

        let logged = logger
            .log_scan(&ScanLogEntry {
                matches: &matched,
                alert_sent,
                total_fetched: fetched,
                summary_group: &config.sheets.summary_group,
                timestamp: started,
            })
            .await;

        info!(
            "Scan complete: {} fetched, {} matched, alert sent: {}",
            fetched,
            matched.len(),
            alert_sent
        );

        let total = matched.len();
        matched.truncate(MAX_REPORT_MATCHES);

        Ok(ScanReport {
            status: ScanStatus::Success,
            timestamp: started,
            fetched,
            matched: total,
            alert_sent,
            logged,
            matches: matched,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Article;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns canned articles per source and records what was asked for
    struct FakeFetcher {
        titles: Vec<&'static str>,
        calls: Mutex<Vec<Vec<Source>>>,
        delay: Option<Duration>,
    }

    impl FakeFetcher {
        fn new(titles: Vec<&'static str>) -> Self {
            Self { titles, calls: Mutex::new(Vec::new()), delay: None }
        }
    }

    #[async_trait]
    impl ArticleFetcher for FakeFetcher {
        async fn fetch(&self, sources: &[Source], window: &FetchWindow) -> Vec<Article> {
            self.calls.lock().unwrap().push(sources.to_vec());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.titles
                .iter()
                .map(|t| Article {
                    title: t.to_string(),
                    link: format!("https://example.com/{}", t.len()),
                    published_at: window.now,
                    summary: None,
                    source: "Fake".to_string(),
                })
                .collect()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, matches: &[MatchedArticle], _scan_time: DateTime<Local>) -> bool {
            self.calls.lock().unwrap().push(matches.len());
            true
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        calls: Mutex<Vec<(usize, bool, usize)>>,
    }

    #[async_trait]
    impl ScanLogger for RecordingLogger {
        async fn log_scan(&self, entry: &ScanLogEntry<'_>) -> bool {
            self.calls
                .lock()
                .unwrap()
                .push((entry.matches.len(), entry.alert_sent, entry.total_fetched));
            true
        }
    }

    fn config(threshold: usize) -> AppConfig {
        AppConfig::from_toml(&format!(
            r#"
            alert_keywords = ["fuel", "diesel"]
            alert_threshold = {}

            [[categories]]
            name = "General"
            feeds = ["https://example.com/rss.xml"]
            queries = ["fuel shortage"]
            newsapi_queries = ["fuel rationing"]
            "#,
            threshold
        ))
        .unwrap()
    }

    struct Harness {
        pipeline: Arc<ScanPipeline>,
        fetcher: Arc<FakeFetcher>,
        notifier: Arc<RecordingNotifier>,
        logger: Arc<RecordingLogger>,
    }

    fn harness(config: AppConfig, fetcher: FakeFetcher) -> Harness {
        let fetcher = Arc::new(fetcher);
        let notifier = Arc::new(RecordingNotifier::default());
        let logger = Arc::new(RecordingLogger::default());

        let pipeline = ScanPipeline::new(ConfigSource::Static(Arc::new(config)))
            .with_fetcher(fetcher.clone())
            .with_notifier(notifier.clone())
            .with_logger(logger.clone());

        Harness { pipeline: Arc::new(pipeline), fetcher, notifier, logger }
    }

    #[tokio::test]
    async fn test_below_threshold_logs_without_alert() {
        let h = harness(
            config(3),
            FakeFetcher::new(vec!["fuel queues", "diesel price", "cricket scores"]),
        );

        let report = h.pipeline.run_once().await;

        assert!(report.is_success());
        assert_eq!(report.fetched, 3);
        assert_eq!(report.matched, 2);
        assert!(!report.alert_sent);
        assert!(h.notifier.calls.lock().unwrap().is_empty());
        assert_eq!(*h.logger.calls.lock().unwrap(), vec![(2, false, 3)]);
    }

    #[tokio::test]
    async fn test_threshold_met_sends_exactly_one_alert() {
        let titles = vec!["fuel one", "fuel two", "diesel fuel three"];
        let h = harness(config(3), FakeFetcher::new(titles));

        let report = h.pipeline.run_once().await;

        assert!(report.alert_sent);
        assert_eq!(*h.notifier.calls.lock().unwrap(), vec![3]);
        assert_eq!(*h.logger.calls.lock().unwrap(), vec![(3, true, 3)]);
        assert_eq!(report.matches[0].article.title, "diesel fuel three");
    }

    #[tokio::test]
    async fn test_no_matches_still_logged() {
        let h = harness(config(1), FakeFetcher::new(vec!["weather", "sport"]));

        let report = h.pipeline.run_once().await;

        assert_eq!(report.matched, 0);
        assert!(h.notifier.calls.lock().unwrap().is_empty());
        assert_eq!(*h.logger.calls.lock().unwrap(), vec![(0, false, 2)]);
    }

    #[tokio::test]
    async fn test_zero_threshold_alerts_on_empty_scan() {
        let h = harness(config(0), FakeFetcher::new(vec!["weather"]));

        let report = h.pipeline.run_once().await;

        assert_eq!(report.matched, 0);
        assert!(report.alert_sent);
        assert_eq!(*h.notifier.calls.lock().unwrap(), vec![0]);
        assert_eq!(*h.logger.calls.lock().unwrap(), vec![(0, true, 1)]);
    }

    #[tokio::test]
    async fn test_report_caps_sample_matches() {
        let titles: Vec<&'static str> = vec!["fuel"; 15];
        let h = harness(config(1), FakeFetcher::new(titles));

        let report = h.pipeline.run_once().await;

        assert_eq!(report.matched, 15);
        assert_eq!(report.matches.len(), MAX_REPORT_MATCHES);
        assert_eq!(*h.notifier.calls.lock().unwrap(), vec![15]);
    }

    #[tokio::test]
    async fn test_source_order_per_category() {
        let h = harness(config(1), FakeFetcher::new(vec![]));
        h.pipeline.run_once().await;

        let calls = h.fetcher.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            vec![
                Source::Feed("https://example.com/rss.xml".to_string()),
                Source::Query("fuel shortage".to_string()),
                Source::NewsApi("fuel rationing".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_category_keywords_and_group_label() {
        let config = AppConfig::from_toml(
            r#"
            alert_keywords = ["fuel"]

            [[categories]]
            name = "Supply"
            feeds = ["https://example.com/a.xml"]
            keywords = ["rationing"]

            [[categories]]
            name = "Prices"
            feeds = ["https://example.com/b.xml"]
            "#,
        )
        .unwrap();
        let h = harness(config, FakeFetcher::new(vec!["fuel rationing", "fuel"]));

        let report = h.pipeline.run_once().await;

        // Supply matches "rationing" only on the first article; Prices matches "fuel" on both
        assert_eq!(report.fetched, 4);
        assert_eq!(report.matched, 3);
        let groups: Vec<_> = report.matches.iter().map(|m| m.search_group.as_str()).collect();
        assert_eq!(groups, ["Supply", "Prices", "Prices"]);
    }

    #[tokio::test]
    async fn test_config_error_becomes_error_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "alert_threshold = [").unwrap();

        let pipeline = ScanPipeline::new(ConfigSource::File(path))
            .with_fetcher(Arc::new(FakeFetcher::new(vec![])))
            .with_notifier(Arc::new(RecordingNotifier::default()))
            .with_logger(Arc::new(RecordingLogger::default()));

        let report = pipeline.run_once().await;

        assert_eq!(report.status, ScanStatus::Error);
        assert!(report.error.unwrap().contains("Configuration error"));
        assert!(!pipeline.is_running());
    }

    #[tokio::test]
    async fn test_config_reloaded_each_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let write = |threshold: usize| {
            std::fs::write(
                &path,
                format!(
                    "alert_keywords = [\"fuel\"]\nalert_threshold = {}\n\n[[categories]]\nname = \"General\"\nfeeds = [\"https://example.com/rss.xml\"]\n",
                    threshold
                ),
            )
            .unwrap();
        };

        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = ScanPipeline::new(ConfigSource::File(path.clone()))
            .with_fetcher(Arc::new(FakeFetcher::new(vec!["fuel"])))
            .with_notifier(notifier.clone())
            .with_logger(Arc::new(RecordingLogger::default()));

        write(5);
        assert!(!pipeline.run_once().await.alert_sent);

        write(1);
        assert!(pipeline.run_once().await.alert_sent);
        assert_eq!(notifier.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_trigger_is_skipped() {
        let mut fetcher = FakeFetcher::new(vec!["fuel"]);
        fetcher.delay = Some(Duration::from_millis(200));
        let h = harness(config(1), fetcher);

        let first = {
            let pipeline = h.pipeline.clone();
            tokio::spawn(async move { pipeline.run_once().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.pipeline.is_running());

        let second = h.pipeline.run_once().await;
        assert_eq!(second.status, ScanStatus::Skipped);

        let first = first.await.unwrap();
        assert!(first.is_success());
        assert!(!h.pipeline.is_running());
        assert_eq!(h.logger.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_report_json_shape() {
        let report = ScanReport::failed("boom");
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["matches"], serde_json::json!([]));

        let back: ScanReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.status, ScanStatus::Error);
    }
}
