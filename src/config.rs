use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::{ChannelList, FrequencyChannel};

pub const DEFAULT_CHANNELS_MHZ: [f64; 9] = [30.0, 32.5, 35.0, 136.0, 138.5, 141.0, 225.0, 243.0, 260.0];

/// Scanner configuration, loadable from a (partial) JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub channels_mhz: Vec<f64>,
    pub sample_rate: f64,
    pub sample_count: usize,
    pub lease_timeout_ms: u64,
    pub scan_interval_ms: u64,
    pub baseline_alpha: f64,
    pub history_len: usize,
    /// Bins within this many dB of the spectral peak count as occupied.
    pub detection_drop_db: f64,
    pub scoring: ScoringConfig,
    pub capture: CaptureConfig,
    pub monitor: MonitorConfig,
    pub events: EventsConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            channels_mhz: DEFAULT_CHANNELS_MHZ.to_vec(),
            sample_rate: 2.4e6,
            sample_count: 256 * 1024,
            lease_timeout_ms: 2000,
            scan_interval_ms: 5000,
            baseline_alpha: 0.1,
            history_len: 60,
            detection_drop_db: 20.0,
            scoring: ScoringConfig::default(),
            capture: CaptureConfig::default(),
            monitor: MonitorConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub power_weight: f64,
    pub bandwidth_weight: f64,
    pub nominal_bandwidth_hz: f64,
    /// Fraction of the nominal bandwidth over which the bandwidth score ramps to 1.
    pub bandwidth_factor: f64,
    pub min_margin_db: f64,
    /// Share of the baseline magnitude used as the adaptive power margin.
    pub margin_fraction: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            power_weight: 0.7,
            bandwidth_weight: 0.3,
            nominal_bandwidth_hz: 200e3,
            bandwidth_factor: 0.25,
            min_margin_db: 3.0,
            margin_fraction: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Composite score at which a capture is requested. `None` disables captures
    /// on the sweep path.
    pub score_threshold: Option<f64>,
    pub sample_count: usize,
    pub directory: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            score_threshold: None,
            sample_count: 2_560_000,
            directory: PathBuf::from("captures"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub center_mhz: f64,
    pub threshold_db: f64,
    pub sample_count: usize,
    pub recent_events: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            center_mhz: 100.0,
            threshold_db: 60.0,
            sample_count: 256 * 1024,
            recent_events: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub path: PathBuf,
    pub default_tag: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rf_events.jsonl"),
            default_tag: "unclassified".to_string(),
        }
    }
}

impl ScannerConfig {
    pub fn from_json(config: Value) -> Result<Self> {
        let config: Self = serde_json::from_value(config)
            .context("Failed to parse scanner config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config from {:?}", path))?;
        let value: Value = serde_json::from_str(&content)
            .context("Failed to parse config JSON")?;

        Self::from_json(value)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channels_mhz.is_empty() {
            bail!("Channel list is empty");
        }

        let mut seen = HashSet::new();
        for &mhz in &self.channels_mhz {
            if !mhz.is_finite() || mhz <= 0.0 {
                bail!("Invalid channel frequency: {} MHz", mhz);
            }
            if !seen.insert(FrequencyChannel::from_mhz(mhz)) {
                bail!("Duplicate channel frequency: {} MHz", mhz);
            }
        }

        if !(self.sample_rate > 0.0) {
            bail!("Sample rate must be positive, got {}", self.sample_rate);
        }
        if self.sample_count == 0 {
            bail!("Sample count must be positive");
        }
        if self.history_len == 0 {
            bail!("History length must be positive");
        }
        if !(self.baseline_alpha > 0.0 && self.baseline_alpha <= 1.0) {
            bail!("Baseline alpha must be in (0, 1], got {}", self.baseline_alpha);
        }

        let weights = self.scoring.power_weight + self.scoring.bandwidth_weight;
        if (weights - 1.0).abs() > 1e-9 {
            bail!("Score weights must sum to 1.0, got {}", weights);
        }
        if !(self.scoring.nominal_bandwidth_hz > 0.0) || !(self.scoring.bandwidth_factor > 0.0) {
            bail!("Nominal bandwidth and bandwidth factor must be positive");
        }

        if let Some(threshold) = self.capture.score_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                bail!("Capture score threshold must be in [0, 1], got {}", threshold);
            }
        }

        Ok(())
    }

    pub fn channel_list(&self) -> ChannelList {
        ChannelList::from_mhz(&self.channels_mhz)
    }

    pub fn lease_timeout(&self) -> Duration {
        Duration::from_millis(self.lease_timeout_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}
