pub mod config;
pub mod error;
pub mod feed;
pub mod matcher;
pub mod notify;
pub mod scheduler;
pub mod server;
pub mod sheets;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use scheduler::{ScanPipeline, ScanReport, SchedulerService, SchedulerStatus};
pub use server::{DaemonClient, DaemonServer};
