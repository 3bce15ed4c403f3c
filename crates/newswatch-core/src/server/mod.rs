//! HTTP trigger server
//!
//! Exposes the scan pipeline and scheduler status over HTTP so a scan can be
//! triggered on demand alongside the periodic timer.

mod client;
mod handlers;
mod protocol;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::scheduler::{ScanPipeline, SchedulerStatus};
use crate::Result;

pub use client::DaemonClient;
pub use protocol::*;

/// State shared by all handlers
pub struct AppState {
    pub pipeline: Arc<ScanPipeline>,
    pub status: Arc<SchedulerStatus>,
    pub start_time: Instant,
}

/// Build the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(routes::INDEX, get(handlers::index))
        .route(routes::SCAN, get(handlers::scan))
        .route(routes::STATUS, get(handlers::status))
        .route(routes::HEALTH, get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// HTTP server that serves scan triggers and status queries
pub struct DaemonServer {
    pipeline: Arc<ScanPipeline>,
    status: Arc<SchedulerStatus>,
    bind: String,
}

impl DaemonServer {
    pub fn new(pipeline: Arc<ScanPipeline>, status: Arc<SchedulerStatus>, bind: impl Into<String>) -> Self {
        Self {
            pipeline,
            status,
            bind: bind.into(),
        }
    }

    /// Serve until the shutdown signal fires
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let listener = TcpListener::bind(&self.bind).await?;
        info!("HTTP server listening on: {}", listener.local_addr()?);

        let app = create_router(AppState {
            pipeline: self.pipeline.clone(),
            status: self.status.clone(),
            start_time: Instant::now(),
        });

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while shutdown_rx.changed().await.is_ok() {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::feed::{Article, ArticleFetcher, FetchWindow, Source};
    use crate::matcher::MatchedArticle;
    use crate::notify::Notifier;
    use crate::scheduler::{ConfigSource, ScanReport, ScanStatus};
    use crate::sheets::{ScanLogEntry, ScanLogger};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{DateTime, Local};
    use tower::ServiceExt;

    struct OneArticle;

    #[async_trait]
    impl ArticleFetcher for OneArticle {
        async fn fetch(&self, _sources: &[Source], window: &FetchWindow) -> Vec<Article> {
            vec![Article {
                title: "Fuel shortage in Perth".to_string(),
                link: "https://example.com/perth".to_string(),
                published_at: window.now,
                summary: None,
                source: "Fake".to_string(),
            }]
        }
    }

    struct Quiet;

    #[async_trait]
    impl Notifier for Quiet {
        async fn notify(&self, _matches: &[MatchedArticle], _scan_time: DateTime<Local>) -> bool {
            true
        }
    }

    #[async_trait]
    impl ScanLogger for Quiet {
        async fn log_scan(&self, _entry: &ScanLogEntry<'_>) -> bool {
            true
        }
    }

    fn app() -> Router {
        let quiet = Arc::new(Quiet);
        let pipeline = ScanPipeline::new(ConfigSource::Static(Arc::new(AppConfig::default())))
            .with_fetcher(Arc::new(OneArticle))
            .with_notifier(quiet.clone())
            .with_logger(quiet);

        create_router(AppState {
            pipeline: Arc::new(pipeline),
            status: Arc::new(SchedulerStatus::new()),
            start_time: Instant::now(),
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_index_metadata() {
        let (status, body) = get_json(app(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "newswatch-core");
        assert_eq!(body["status"], "running");
        assert_eq!(body["endpoints"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_scan_endpoint_runs_pipeline() {
        let (status, body) = get_json(app(), "/scan").await;

        assert_eq!(status, StatusCode::OK);
        let report: ScanReport = serde_json::from_value(body).unwrap();
        assert_eq!(report.status, ScanStatus::Success);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.matched, 1);
        assert!(report.alert_sent);
        assert_eq!(report.matches[0].matched_keywords, ["fuel shortage"]);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (status, body) = get_json(app(), "/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scheduler_running"], false);
        assert_eq!(body["active_jobs"], 0);
        assert_eq!(body["scan_in_progress"], false);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
