use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use super::trigger;
use crate::capture::{CaptureReason, CaptureRequest};
use crate::config::ScannerConfig;
use crate::core::FrequencyChannel;
use crate::dsp::{bin_frequencies, power_spectrum_db};
use crate::error::ScanError;
use crate::hal::SpectrumSampler;

/// One entry in the monitor's recent-event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorEvent {
    pub timestamp: DateTime<Utc>,
    pub center_mhz: f64,
    pub score_db: f64,
    pub message: String,
}

/// Result of a single live-monitor poll.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReading {
    /// Shifted magnitude spectrum in dB.
    pub spectrum: Vec<f64>,
    /// Absolute frequency of each spectrum bin.
    pub frequencies_mhz: Vec<f64>,
    pub score_db: f64,
    pub triggered: bool,
    pub capture: Option<CaptureRequest>,
}

/// Single-channel spectrum watcher.
pub struct LiveMonitor {
    sampler: SpectrumSampler,
    lease_timeout: Duration,
    sample_rate: f64,
    sample_count: usize,
    capture_sample_count: usize,
    recent_capacity: usize,
    recent: Mutex<VecDeque<MonitorEvent>>,
}

impl LiveMonitor {
    pub fn new(sampler: SpectrumSampler, config: &ScannerConfig) -> Self {
        Self {
            sampler,
            lease_timeout: config.lease_timeout(),
            sample_rate: config.sample_rate,
            sample_count: config.monitor.sample_count,
            capture_sample_count: config.capture.sample_count,
            recent_capacity: config.monitor.recent_events,
            recent: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn poll(&self, center_mhz: f64, threshold_db: f64) -> Result<MonitorReading, ScanError> {
        let mut lease = self.sampler.acquire(self.lease_timeout).await?;
        let block = lease
            .tune_and_read(center_mhz, self.sample_rate, self.sample_count)
            .await?;
        lease.release();

        let spectrum = power_spectrum_db(&block.samples);
        let frequencies_mhz = bin_frequencies(spectrum.len(), self.sample_rate)
            .into_iter()
            .map(|offset| center_mhz + offset / 1e6)
            .collect();

        let score_db = spread_statistic(&spectrum);
        let triggered = trigger::check(score_db, threshold_db);
        debug!(center_mhz, score_db, threshold_db, triggered, "monitor poll");

        let capture = if triggered {
            self.push_event(center_mhz, score_db);
            Some(CaptureRequest {
                channel: FrequencyChannel::from_mhz(center_mhz),
                sample_rate: self.sample_rate,
                sample_count: self.capture_sample_count,
                reason: CaptureReason::LiveMonitor {
                    score_db,
                    threshold_db,
                },
            })
        } else {
            None
        };

        Ok(MonitorReading {
            spectrum,
            frequencies_mhz,
            score_db,
            triggered,
            capture,
        })
    }

    /// Most recent trigger messages, oldest first.
    pub fn recent_events(&self) -> Vec<MonitorEvent> {
        let recent = self.recent.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        recent.iter().cloned().collect()
    }

    fn push_event(&self, center_mhz: f64, score_db: f64) {
        let timestamp = Utc::now();
        let message = format!(
            "[{}] Jamming detected @ {:.2} MHz (score {:.1} dB)",
            timestamp.format("%H:%M:%S"),
            center_mhz,
            score_db
        );
        info!(center_mhz, score_db, "{}", message);

        let mut recent = self.recent.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        recent.push_back(MonitorEvent {
            timestamp,
            center_mhz,
            score_db,
            message,
        });
        while recent.len() > self.recent_capacity {
            recent.pop_front();
        }
    }
}

/// `mean + 2 * stddev` (population) of a dB spectrum.
pub fn spread_statistic(spectrum: &[f64]) -> f64 {
    if spectrum.is_empty() {
        return f64::NEG_INFINITY;
    }
    let n = spectrum.len() as f64;
    let mean = spectrum.iter().sum::<f64>() / n;
    let variance = spectrum.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    mean + 2.0 * variance.sqrt()
}
