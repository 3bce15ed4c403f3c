use chrono::{DateTime, Local};

use crate::matcher::MatchedArticle;

/// Column headers written when the spreadsheet is created
pub const HEADER_ROW: [&str; 8] = [
    "Timestamp",
    "Article Title",
    "URL",
    "Source",
    "Matched Keywords",
    "Match Score",
    "Alert Sent",
    "Search Group",
];

/// Title cell of the summary row written for an empty scan
pub const NO_MATCHES_TITLE: &str = "[Scan completed - No matches found]";

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// Rows for one scan: one per matched article, or one summary row when
/// `matches` is empty
pub fn build_rows(
    matches: &[MatchedArticle],
    alert_sent: bool,
    total_fetched: usize,
    summary_group: &str,
    timestamp: DateTime<Local>,
) -> Vec<Vec<String>> {
    let stamp = timestamp.format("%Y-%m-%d %H:%M:%S").to_string();

    if matches.is_empty() {
        return vec![vec![
            stamp,
            NO_MATCHES_TITLE.to_string(),
            format!("Total articles scanned: {}", total_fetched),
            "System".to_string(),
            "None".to_string(),
            "0".to_string(),
            "No".to_string(),
            summary_group.to_string(),
        ]];
    }

    let alert = if alert_sent { "Yes" } else { "No" };

    matches
        .iter()
        .map(|m| {
            vec![
                stamp.clone(),
                or_placeholder(&m.article.title, "N/A"),
                or_placeholder(&m.article.link, "N/A"),
                or_placeholder(&m.article.source, "Unknown"),
                m.keywords_joined(),
                m.match_score.to_string(),
                alert.to_string(),
                m.search_group.clone(),
            ]
        })
        .collect()
}
