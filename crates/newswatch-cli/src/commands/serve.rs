use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info};

use newswatch_core::scheduler::{ConfigSource, SchedulerStatus};
use newswatch_core::{AppConfig, DaemonServer, ScanPipeline, SchedulerService};

/// Run the scan timer and the HTTP trigger server until Ctrl+C
pub async fn run(config_path: PathBuf, config: &AppConfig) -> Result<()> {
    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx_clone.send(true);
    });

    let pipeline = Arc::new(ScanPipeline::new(ConfigSource::File(config_path.clone())));
    let status = Arc::new(SchedulerStatus::new());

    let scheduler = SchedulerService::new(pipeline.clone(), config.sync.scan_interval_secs)
        .with_run_on_start(config.sync.run_on_start)
        .with_status(status.clone());

    let server = DaemonServer::new(pipeline, status, config.server.bind.clone());

    println!("newswatch started. Press Ctrl+C to stop.");
    println!("  Config: {}", config_path.display());
    println!("  Scan interval: {} seconds", config.sync.scan_interval_secs);
    println!("  Listening on: {}", config.server.bind);

    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    // Server errors (e.g. bind failure) stop the scheduler as well
    let server_result = server.run(shutdown_rx).await;
    if let Err(ref e) = server_result {
        error!("HTTP server failed: {}", e);
        let _ = shutdown_tx.send(true);
    }

    scheduler_task.await.ok();
    println!("newswatch stopped.");

    server_result.map_err(Into::into)
}
