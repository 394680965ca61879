use chrono::{DateTime, Utc};
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

use super::FrequencyChannel;

/// Raw complex baseband samples from one receiver read.
#[derive(Debug, Clone)]
pub struct SampleBlock {
    pub samples: Vec<Complex32>,
    pub sample_rate: f64,
    pub center_frequency_hz: f64,
}

impl SampleBlock {
    pub fn new(samples: Vec<Complex32>, sample_rate: f64, center_frequency_hz: f64) -> Self {
        Self {
            samples,
            sample_rate,
            center_frequency_hz,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Interleaved little-endian complex64 (f32 re, f32 im).
    pub fn to_complex64_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 8);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.re.to_le_bytes());
            bytes.extend_from_slice(&sample.im.to_le_bytes());
        }
        bytes
    }
}

/// Power and bandwidth of a single channel in a single sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralMeasurement {
    pub channel: FrequencyChannel,
    pub power_db: f64,
    pub bandwidth_hz: f64,
}

/// A channel power, or `None` when the channel could not be measured.
pub type PowerReading = Option<f64>;

/// One sweep: a timestamp and one reading per channel, in scan order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub timestamp: DateTime<Utc>,
    pub powers: Vec<PowerReading>,
}

impl SweepRow {
    pub fn missing_count(&self) -> usize {
        self.powers.iter().filter(|p| p.is_none()).count()
    }
}
