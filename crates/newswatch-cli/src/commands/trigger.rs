use anyhow::{bail, Result};

use newswatch_core::DaemonClient;

use super::scan::print_report;

pub async fn run(server_url: &str) -> Result<()> {
    let client = DaemonClient::new(server_url)?;
    if !client.ping().await {
        bail!("newswatch is not running at {}. Start it with `newswatch serve`.", server_url);
    }

    println!("Triggering scan on {}...\n", server_url);
    let report = client.scan().await?;
    print_report(&report);

    Ok(())
}
