//! JSON bodies exchanged with the HTTP trigger server

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// Endpoint paths
pub mod routes {
    pub const INDEX: &str = "/";
    pub const SCAN: &str = "/scan";
    pub const STATUS: &str = "/status";
    pub const HEALTH: &str = "/health";
}

/// `GET /` service metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
    pub description: String,
    pub scan_interval_secs: u64,
    pub endpoints: Vec<String>,
}

/// `GET /status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub scheduler_running: bool,
    pub active_jobs: usize,
    pub next_run: Option<DateTime<Local>>,
    pub scan_in_progress: bool,
    pub uptime_secs: u64,
}
