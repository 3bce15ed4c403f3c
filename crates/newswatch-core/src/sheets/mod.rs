//! Spreadsheet scan log
//!
//! Every scan appends rows to a Google Sheets spreadsheet: one row per
//! matched article, or a single summary row when nothing matched, so an
//! empty scan is distinguishable from a scan that never logged.

mod auth;
mod client;
mod rows;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::matcher::MatchedArticle;

pub use auth::AccessTokenProvider;
pub use client::{SheetsClient, SheetsLogger};
pub use rows::{build_rows, HEADER_ROW, NO_MATCHES_TITLE};

/// Everything recorded about one scan
#[derive(Debug, Clone)]
pub struct ScanLogEntry<'a> {
    pub matches: &'a [MatchedArticle],
    pub alert_sent: bool,
    pub total_fetched: usize,
    /// Search group written on the summary row when `matches` is empty
    pub summary_group: &'a str,
    pub timestamp: DateTime<Local>,
}

/// Appends scan results to an external log
#[async_trait]
pub trait ScanLogger: Send + Sync {
    /// Record a scan. Returns whether the rows were written; failures are
    /// logged, never propagated.
    async fn log_scan(&self, entry: &ScanLogEntry<'_>) -> bool;
}
