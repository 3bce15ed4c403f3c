mod pipeline;
mod service;

pub use pipeline::{ConfigSource, ScanPipeline, ScanReport, ScanStatus, MAX_REPORT_MATCHES};
pub use service::{SchedulerService, SchedulerSnapshot, SchedulerStatus};
