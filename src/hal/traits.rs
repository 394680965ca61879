use anyhow::Result;
use async_trait::async_trait;
use num_complex::Complex32;

/// Hardware boundary for an SDR-class receiver.
///
/// Any device that can be tuned, rate-configured and read in blocks of
/// complex baseband samples satisfies this. The scanner never talks to a
/// `Receiver` directly; it goes through a [`SpectrumSampler`](super::SpectrumSampler)
/// lease.
#[async_trait]
pub trait Receiver: Send {
    /// Human readable device name for logs
    fn name(&self) -> &str;

    async fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()>;

    async fn set_center_frequency(&mut self, frequency_hz: f64) -> Result<()>;

    /// Switch the tuner to automatic gain control.
    async fn set_gain_auto(&mut self) -> Result<()>;

    /// Block until `sample_count` samples have been read.
    async fn read(&mut self, sample_count: usize) -> Result<Vec<Complex32>>;

    async fn close(&mut self) -> Result<()>;
}
