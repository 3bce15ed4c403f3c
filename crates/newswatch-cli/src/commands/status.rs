use anyhow::Result;

use newswatch_core::DaemonClient;

pub async fn run(server_url: &str) -> Result<()> {
    let client = DaemonClient::new(server_url)?;

    let Ok(info) = client.info().await else {
        println!("newswatch is not running at {}", server_url);
        return Ok(());
    };
    let status = client.status().await?;

    println!("Server: {} ({} v{})", server_url, info.service, info.version);
    println!(
        "Scheduler: {} ({} active job{})",
        if status.scheduler_running { "running" } else { "stopped" },
        status.active_jobs,
        if status.active_jobs == 1 { "" } else { "s" }
    );
    match status.next_run {
        Some(next) => println!("Next scan: {}", next.format("%Y-%m-%d %H:%M:%S")),
        None => println!("Next scan: not scheduled"),
    }
    if status.scan_in_progress {
        println!("A scan is in progress.");
    }
    println!("Uptime: {} seconds", status.uptime_secs);

    Ok(())
}
