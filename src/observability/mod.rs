pub mod metrics;
pub mod monitor;

pub use metrics::{ScanMetrics, ScanMetricsSnapshot};
pub use monitor::ScanMonitor;
