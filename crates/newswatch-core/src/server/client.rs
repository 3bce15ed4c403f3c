//! Client for a running newswatch server

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use super::protocol::{routes, ServiceInfo, StatusResponse};
use crate::scheduler::ScanReport;
use crate::{Error, Result};

/// Scans can take a while; give the trigger call generous headroom
const SCAN_TIMEOUT_SECS: u64 = 600;

#[derive(Clone)]
pub struct DaemonClient {
    client: Client,
    base_url: String,
}

impl DaemonClient {
    /// `base_url` like "http://127.0.0.1:5000"
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SCAN_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Check if the server answers
    pub async fn ping(&self) -> bool {
        self.info().await.is_ok()
    }

    pub async fn info(&self) -> Result<ServiceInfo> {
        self.get(routes::INDEX).await
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        self.get(routes::STATUS).await
    }

    /// Trigger a scan on the server and wait for its report
    pub async fn scan(&self) -> Result<ScanReport> {
        self.get(routes::SCAN).await
    }

    /// GET a JSON endpoint. Error statuses still carry a JSON body for /scan,
    /// so the body is decoded before the status is judged.
    async fn get<T: DeserializeOwned>(&self, route: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, route);

        let response = self.client.get(&url).send().await.map_err(|e| {
            Error::Other(format!(
                "Failed to connect to newswatch at {}: {}. Is the server running?",
                self.base_url, e
            ))
        })?;

        let status = response.status();
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            Error::Other(format!("Unexpected response from {} (HTTP {}): {}", url, status, e))
        })
    }
}
