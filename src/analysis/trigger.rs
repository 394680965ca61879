use std::collections::HashSet;
use std::sync::Mutex;

use crate::capture::{CaptureReason, CaptureRequest};
use crate::core::{FrequencyChannel, SpectralMeasurement};

/// Stateless threshold comparison used by the live monitor.
pub fn check(score: f64, threshold: f64) -> bool {
    score > threshold
}

/// Capture policy for the multi-channel sweep.
///
/// Fires when a channel's composite score reaches the threshold and stays
/// latched until the score falls back below it, so one sustained anomaly
/// produces one capture request. Without a threshold it never fires.
pub struct CompositeTrigger {
    threshold: Option<f64>,
    sample_rate: f64,
    sample_count: usize,
    latched: Mutex<HashSet<FrequencyChannel>>,
}

impl CompositeTrigger {
    pub fn new(threshold: Option<f64>, sample_rate: f64, sample_count: usize) -> Self {
        Self {
            threshold,
            sample_rate,
            sample_count,
            latched: Mutex::new(HashSet::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, 0.0, 0)
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn evaluate(&self, measurement: &SpectralMeasurement, score: f64) -> Option<CaptureRequest> {
        let threshold = self.threshold?;
        let mut latched = self.latched.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if score < threshold {
            latched.remove(&measurement.channel);
            return None;
        }
        if !latched.insert(measurement.channel) {
            return None;
        }

        Some(CaptureRequest {
            channel: measurement.channel,
            sample_rate: self.sample_rate,
            sample_count: self.sample_count,
            reason: CaptureReason::CompositeScore {
                score,
                power_db: measurement.power_db,
                bandwidth_hz: measurement.bandwidth_hz,
            },
        })
    }

    /// Re-arm a channel that stopped being measured.
    pub fn clear(&self, channel: FrequencyChannel) {
        let mut latched = self.latched.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        latched.remove(&channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(mhz: f64) -> SpectralMeasurement {
        SpectralMeasurement {
            channel: FrequencyChannel::from_mhz(mhz),
            power_db: -20.0,
            bandwidth_hz: 250e3,
        }
    }

    #[test]
    fn test_check_is_strict() {
        assert!(check(61.0, 60.0));
        assert!(!check(60.0, 60.0));
        assert!(!check(-10.0, 60.0));
    }

    #[test]
    fn test_disabled_never_fires() {
        let trigger = CompositeTrigger::disabled();
        assert!(trigger.evaluate(&measurement(30.0), 1.0).is_none());
    }

    #[test]
    fn test_fires_once_per_event() {
        let trigger = CompositeTrigger::new(Some(0.5), 2.4e6, 1000);
        let m = measurement(30.0);

        let request = trigger.evaluate(&m, 0.7).unwrap();
        assert_eq!(request.channel, m.channel);
        assert_eq!(request.sample_count, 1000);

        assert!(trigger.evaluate(&m, 0.9).is_none());
        assert!(trigger.evaluate(&m, 0.2).is_none());
        assert!(trigger.evaluate(&m, 0.5).is_some());
    }

    #[test]
    fn test_channels_latch_independently() {
        let trigger = CompositeTrigger::new(Some(0.5), 2.4e6, 1000);

        assert!(trigger.evaluate(&measurement(30.0), 0.7).is_some());
        assert!(trigger.evaluate(&measurement(136.0), 0.7).is_some());

        trigger.clear(FrequencyChannel::from_mhz(30.0));
        assert!(trigger.evaluate(&measurement(30.0), 0.7).is_some());
    }
}
