use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capture::CaptureRequest;

/// One durable event row: `(timestamp, frequency, peak_power, bandwidth, iq_path, tag)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub frequency_mhz: f64,
    pub peak_power_db: f64,
    pub bandwidth_hz: f64,
    pub iq_path: Option<String>,
    pub tag: String,
}

impl EventRecord {
    pub fn from_capture(
        request: &CaptureRequest,
        iq_path: Option<String>,
        tag: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            frequency_mhz: request.frequency_mhz(),
            peak_power_db: request.reason.peak_power_db(),
            bandwidth_hz: request.reason.bandwidth_hz().unwrap_or(0.0),
            iq_path,
            tag: tag.into(),
        }
    }
}
