use num_complex::Complex32;

use super::spectrum::{bin_frequencies, power_spectrum_db, power_to_db};

pub const DEFAULT_DETECTION_DROP_DB: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerEstimate {
    pub power_db: f64,
    pub occupied_bandwidth_hz: f64,
}

/// Scalar power and occupied-bandwidth estimation for one block.
///
/// Stateless; identical input always gives identical output.
#[derive(Debug, Clone, Copy)]
pub struct PowerEstimator {
    detection_drop_db: f64,
}

impl Default for PowerEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_DETECTION_DROP_DB)
    }
}

impl PowerEstimator {
    pub fn new(detection_drop_db: f64) -> Self {
        Self { detection_drop_db }
    }

    pub fn estimate(&self, samples: &[Complex32], sample_rate: f64) -> PowerEstimate {
        PowerEstimate {
            power_db: mean_power_db(samples),
            occupied_bandwidth_hz: self.occupied_bandwidth(samples, sample_rate),
        }
    }

    /// Span between the outermost bins within `detection_drop_db` of the peak.
    pub fn occupied_bandwidth(&self, samples: &[Complex32], sample_rate: f64) -> f64 {
        if samples.iter().all(|s| s.re == 0.0 && s.im == 0.0) {
            return 0.0;
        }

        let spectrum = power_spectrum_db(samples);
        let peak = spectrum.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let threshold = peak - self.detection_drop_db;

        let first = spectrum.iter().position(|&db| db > threshold);
        let last = spectrum.iter().rposition(|&db| db > threshold);

        match (first, last) {
            (Some(first), Some(last)) if last > first => {
                let freqs = bin_frequencies(spectrum.len(), sample_rate);
                freqs[last] - freqs[first]
            }
            _ => 0.0,
        }
    }
}

/// Time-domain mean power of the block in dB.
pub fn mean_power_db(samples: &[Complex32]) -> f64 {
    if samples.is_empty() {
        return power_to_db(0.0);
    }
    let total: f64 = samples.iter().map(|s| s.norm_sqr() as f64).sum();
    power_to_db(total / samples.len() as f64)
}
