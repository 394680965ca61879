use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for the scan loop. Safe to share between the runner and reporters.
#[derive(Default)]
pub struct ScanMetrics {
    sweeps_completed: AtomicU64,
    sweeps_skipped: AtomicU64,
    channel_faults: AtomicU64,
    capture_requests: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanMetricsSnapshot {
    pub sweeps_completed: u64,
    pub sweeps_skipped: u64,
    pub channel_faults: u64,
    pub capture_requests: u64,
    pub avg_sweep_latency_us: u64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps_completed.load(Ordering::Relaxed)
    }

    pub fn sweeps_skipped(&self) -> u64 {
        self.sweeps_skipped.load(Ordering::Relaxed)
    }

    pub fn channel_faults(&self) -> u64 {
        self.channel_faults.load(Ordering::Relaxed)
    }

    pub fn capture_requests(&self) -> u64 {
        self.capture_requests.load(Ordering::Relaxed)
    }

    pub fn record_sweep_skipped(&self) {
        self.sweeps_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_channel_fault(&self) {
        self.channel_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture_requests(&self, count: usize) {
        self.capture_requests.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn start_sweep(&self) -> Instant {
        Instant::now()
    }

    /// Count a finished sweep and its duration.
    pub fn finish_sweep(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.sweeps_completed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_sweep_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }

    pub fn snapshot(&self) -> ScanMetricsSnapshot {
        ScanMetricsSnapshot {
            sweeps_completed: self.sweeps_completed(),
            sweeps_skipped: self.sweeps_skipped(),
            channel_faults: self.channel_faults(),
            capture_requests: self.capture_requests(),
            avg_sweep_latency_us: self.avg_sweep_latency_us(),
        }
    }
}
