use std::sync::Arc;

use super::ScanMetrics;

/// Plain-text summary of scan activity.
pub struct ScanMonitor {
    metrics: Arc<ScanMetrics>,
}

impl ScanMonitor {
    pub fn new(metrics: Arc<ScanMetrics>) -> Self {
        Self { metrics }
    }

    pub fn report(&self) -> String {
        let s = self.metrics.snapshot();

        let faults = match s.channel_faults {
            0 => "0 faults".to_string(),
            1 => "1 fault".to_string(),
            n => format!("{} faults", n),
        };

        format!(
            "=== Scan Metrics ===\n  Sweeps: {} completed, {} skipped (busy)\n  Channels: {}\n  Captures requested: {}\n  Avg Sweep Latency: {}μs\n",
            s.sweeps_completed, s.sweeps_skipped, faults, s.capture_requests, s.avg_sweep_latency_us
        )
    }

    pub fn metrics(&self) -> &Arc<ScanMetrics> {
        &self.metrics
    }
}
