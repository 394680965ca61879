use anyhow::{anyhow, Result};
use async_trait::async_trait;
use num_complex::Complex32;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::FrequencyChannel;
use crate::hal::Receiver;

/// Number of equal-amplitude tones used to fill a simulated bandwidth.
const TONES_PER_PROFILE: usize = 16;

/// What the simulated receiver "hears" on a frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneProfile {
    /// Mean sample power in dB; `None` produces an all-zero block.
    pub power_db: Option<f64>,
    pub bandwidth_hz: f64,
}

impl ToneProfile {
    pub fn new(power_db: f64, bandwidth_hz: f64) -> Self {
        Self {
            power_db: Some(power_db),
            bandwidth_hz,
        }
    }

    pub fn silent() -> Self {
        Self {
            power_db: None,
            bandwidth_hz: 0.0,
        }
    }
}

impl Default for ToneProfile {
    fn default() -> Self {
        Self::new(-60.0, 150e3)
    }
}

#[derive(Debug, Default)]
struct SimulatedState {
    profiles: HashMap<FrequencyChannel, ToneProfile>,
    faults: HashSet<FrequencyChannel>,
    read_delay: Option<Duration>,
    gain_auto: bool,
}

/// Shared handle for changing what a [`SimulatedReceiver`] produces after it
/// has been handed to a sampler.
#[derive(Debug, Clone)]
pub struct SimulatedControls {
    state: Arc<Mutex<SimulatedState>>,
    reads: Arc<AtomicUsize>,
}

impl SimulatedControls {
    fn lock(&self) -> std::sync::MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_profile(&self, frequency_mhz: f64, profile: ToneProfile) {
        self.lock()
            .profiles
            .insert(FrequencyChannel::from_mhz(frequency_mhz), profile);
    }

    pub fn set_fault(&self, frequency_mhz: f64, faulted: bool) {
        let channel = FrequencyChannel::from_mhz(frequency_mhz);
        let mut state = self.lock();
        if faulted {
            state.faults.insert(channel);
        } else {
            state.faults.remove(&channel);
        }
    }

    pub fn set_read_delay(&self, delay: Option<Duration>) {
        self.lock().read_delay = delay;
    }

    /// Whether the receiver has been switched to automatic gain.
    pub fn is_gain_auto(&self) -> bool {
        self.lock().gain_auto
    }

    /// Successful and failed reads so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

/// Deterministic software receiver used for tests and `--simulate`.
///
/// Each frequency produces a set of bin-centred tones spread evenly over the
/// profile's bandwidth, scaled so the block's mean power equals the profile's
/// `power_db`. Reads of the same frequency with the same parameters are
/// bit-identical.
pub struct SimulatedReceiver {
    controls: SimulatedControls,
    default_profile: ToneProfile,
    sample_rate: f64,
    center_hz: Option<f64>,
    closed: bool,
}

impl SimulatedReceiver {
    pub fn new() -> Self {
        Self {
            controls: SimulatedControls {
                state: Arc::new(Mutex::new(SimulatedState::default())),
                reads: Arc::new(AtomicUsize::new(0)),
            },
            default_profile: ToneProfile::default(),
            sample_rate: 2.4e6,
            center_hz: None,
            closed: false,
        }
    }

    pub fn with_default_profile(mut self, profile: ToneProfile) -> Self {
        self.default_profile = profile;
        self
    }

    pub fn with_profile(self, frequency_mhz: f64, profile: ToneProfile) -> Self {
        self.controls.set_profile(frequency_mhz, profile);
        self
    }

    pub fn with_fault(self, frequency_mhz: f64) -> Self {
        self.controls.set_fault(frequency_mhz, true);
        self
    }

    pub fn with_read_delay(self, delay: Duration) -> Self {
        self.controls.set_read_delay(Some(delay));
        self
    }

    pub fn controls(&self) -> SimulatedControls {
        self.controls.clone()
    }

    fn generate(&self, profile: ToneProfile, sample_count: usize) -> Vec<Complex32> {
        let Some(power_db) = profile.power_db else {
            return vec![Complex32::new(0.0, 0.0); sample_count];
        };
        if sample_count == 0 {
            return Vec::new();
        }

        let n = sample_count as i64;
        let bins = tone_bins(profile.bandwidth_hz, self.sample_rate, sample_count);
        let amplitude = (10f64.powf(power_db / 10.0) / bins.len() as f64).sqrt();

        (0..n)
            .map(|i| {
                let (re, im) = bins.iter().fold((0.0f64, 0.0f64), |(re, im), &k| {
                    // Exact integer phase keeps every read bit-identical
                    let phase = 2.0 * PI * ((k * i).rem_euclid(n)) as f64 / n as f64;
                    (re + phase.cos(), im + phase.sin())
                });
                Complex32::new((amplitude * re) as f32, (amplitude * im) as f32)
            })
            .collect()
    }
}

impl Default for SimulatedReceiver {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct DFT bin indices (signed, relative to DC) spanning `bandwidth_hz`.
fn tone_bins(bandwidth_hz: f64, sample_rate: f64, sample_count: usize) -> Vec<i64> {
    let bin_width = sample_rate / sample_count as f64;
    let half = (sample_count / 2) as i64;

    let bins: BTreeSet<i64> = (0..TONES_PER_PROFILE)
        .map(|t| {
            let offset = -bandwidth_hz / 2.0
                + bandwidth_hz * t as f64 / (TONES_PER_PROFILE - 1) as f64;
            ((offset / bin_width).round() as i64).clamp(-half, half - 1)
        })
        .collect();

    bins.into_iter().collect()
}

#[async_trait]
impl Receiver for SimulatedReceiver {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        if self.closed {
            return Err(anyhow!("Receiver is closed"));
        }
        if !(sample_rate > 0.0) {
            return Err(anyhow!("Invalid sample rate: {}", sample_rate));
        }
        self.sample_rate = sample_rate;
        Ok(())
    }

    async fn set_center_frequency(&mut self, frequency_hz: f64) -> Result<()> {
        if self.closed {
            return Err(anyhow!("Receiver is closed"));
        }
        self.center_hz = Some(frequency_hz);
        Ok(())
    }

    async fn set_gain_auto(&mut self) -> Result<()> {
        self.controls.lock().gain_auto = true;
        Ok(())
    }

    async fn read(&mut self, sample_count: usize) -> Result<Vec<Complex32>> {
        if self.closed {
            return Err(anyhow!("Receiver is closed"));
        }
        let center_hz = self.center_hz.ok_or_else(|| anyhow!("Receiver not tuned"))?;
        let channel = FrequencyChannel::from_mhz(center_hz / 1e6);

        let (profile, faulted, delay) = {
            let state = self.controls.lock();
            (
                state.profiles.get(&channel).copied().unwrap_or(self.default_profile),
                state.faults.contains(&channel),
                state.read_delay,
            )
        };

        self.controls.reads.fetch_add(1, Ordering::Relaxed);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if faulted {
            return Err(anyhow!("Simulated device fault at {}", channel));
        }

        Ok(self.generate(profile, sample_count))
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean_power_db(samples: &[Complex32]) -> f64 {
        let mean = samples.iter().map(|s| s.norm_sqr() as f64).sum::<f64>() / samples.len() as f64;
        10.0 * mean.log10()
    }

    #[tokio::test]
    async fn test_profile_sets_mean_power() {
        let mut receiver = SimulatedReceiver::new().with_profile(30.0, ToneProfile::new(-50.0, 150e3));
        receiver.set_center_frequency(30e6).await.unwrap();

        let samples = receiver.read(4096).await.unwrap();
        assert_eq!(samples.len(), 4096);
        assert!((mean_power_db(&samples) - -50.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_fault_and_untuned_reads_fail() {
        let mut receiver = SimulatedReceiver::new().with_fault(136.0);
        assert!(receiver.read(16).await.is_err());

        receiver.set_center_frequency(136e6).await.unwrap();
        assert!(receiver.read(16).await.is_err());
        assert_eq!(receiver.controls().read_count(), 1);
    }

    #[tokio::test]
    async fn test_closed_receiver_rejects_reads() {
        let mut receiver = SimulatedReceiver::new();
        receiver.set_center_frequency(30e6).await.unwrap();
        receiver.close().await.unwrap();
        assert!(receiver.read(16).await.is_err());
    }

    #[test]
    fn test_tone_bins_span_bandwidth() {
        let bins = tone_bins(150e3, 2.4e6, 4096);
        let bin_width = 2.4e6 / 4096.0;
        let span = (bins[bins.len() - 1] - bins[0]) as f64 * bin_width;

        assert!((span - 150e3).abs() <= 2.0 * bin_width);
        assert_eq!(tone_bins(0.0, 2.4e6, 4096), vec![0]);
    }
}
