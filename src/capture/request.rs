use serde::{Deserialize, Serialize};

use crate::core::FrequencyChannel;

/// Why a capture was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureReason {
    /// Sweep path: composite score reached the capture threshold.
    CompositeScore {
        score: f64,
        power_db: f64,
        bandwidth_hz: f64,
    },
    /// Live monitor: spectrum statistic exceeded the operator threshold.
    LiveMonitor { score_db: f64, threshold_db: f64 },
}

impl CaptureReason {
    pub fn peak_power_db(&self) -> f64 {
        match self {
            Self::CompositeScore { power_db, .. } => *power_db,
            Self::LiveMonitor { score_db, .. } => *score_db,
        }
    }

    pub fn bandwidth_hz(&self) -> Option<f64> {
        match self {
            Self::CompositeScore { bandwidth_hz, .. } => Some(*bandwidth_hz),
            Self::LiveMonitor { .. } => None,
        }
    }
}

/// Parameters for an independent raw-IQ capture. Holds no hardware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub channel: FrequencyChannel,
    pub sample_rate: f64,
    pub sample_count: usize,
    pub reason: CaptureReason,
}

impl CaptureRequest {
    pub fn frequency_mhz(&self) -> f64 {
        self.channel.mhz()
    }
}
