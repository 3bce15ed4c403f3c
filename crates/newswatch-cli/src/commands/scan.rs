use std::path::PathBuf;

use anyhow::{bail, Result};

use newswatch_core::scheduler::{ConfigSource, ScanStatus};
use newswatch_core::{ScanPipeline, ScanReport};

/// Run one scan in-process and print the report
pub async fn run(config_path: PathBuf, json: bool) -> Result<()> {
    let pipeline = ScanPipeline::new(ConfigSource::File(config_path));
    let report = pipeline.run_once().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.status == ScanStatus::Error {
        bail!(
            "Scan failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

pub fn print_report(report: &ScanReport) {
    println!(
        "Scan {} at {}",
        match report.status {
            ScanStatus::Success => "completed",
            ScanStatus::Skipped => "skipped (another scan is running)",
            ScanStatus::Error => "failed",
        },
        report.timestamp.format("%Y-%m-%d %H:%M:%S")
    );

    if report.status != ScanStatus::Success {
        if let Some(err) = &report.error {
            println!("  Error: {}", err);
        }
        return;
    }

    println!("  Articles fetched: {}", report.fetched);
    println!("  Articles matched: {}", report.matched);
    println!("  Alert sent: {}", if report.alert_sent { "yes" } else { "no" });
    println!("  Logged: {}", if report.logged { "yes" } else { "no" });

    if report.matches.is_empty() {
        return;
    }

    println!("\nTop matches:\n");
    for m in &report.matches {
        println!("  [{}] {}", m.match_score, m.article.title);
        println!("    Keywords: {}", m.keywords_joined());
        println!("    Source: {} ({})", m.article.source, m.search_group);
        if !m.article.link.is_empty() {
            println!("    {}", m.article.link);
        }
    }
}
