use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::protocol::{routes, ServiceInfo, StatusResponse};
use super::AppState;
use crate::scheduler::ScanStatus;

pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.status.snapshot().await;

    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        description: env!("CARGO_PKG_DESCRIPTION").to_string(),
        scan_interval_secs: snapshot.interval_secs,
        endpoints: [routes::INDEX, routes::SCAN, routes::STATUS, routes::HEALTH]
            .iter()
            .map(|r| r.to_string())
            .collect(),
    })
}

/// Run one scan synchronously and return its report
pub async fn scan(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::info!("Manual scan triggered");

    let report = state.pipeline.run_once().await;
    let code = match report.status {
        ScanStatus::Success => StatusCode::OK,
        ScanStatus::Skipped => StatusCode::CONFLICT,
        ScanStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (code, Json(report))
}

pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.status.snapshot().await;

    Json(StatusResponse {
        scheduler_running: snapshot.running,
        active_jobs: snapshot.jobs,
        next_run: snapshot.next_run,
        scan_in_progress: state.pipeline.is_running(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
