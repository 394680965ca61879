use anyhow::{anyhow, Context};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use super::Receiver;
use crate::core::SampleBlock;
use crate::error::ScanError;

/// Exclusive access point to the one physical receiver.
///
/// All reads go through a [`Lease`]; at most one lease exists at any time.
#[derive(Clone)]
pub struct SpectrumSampler {
    receiver: Arc<Mutex<Box<dyn Receiver>>>,
}

impl SpectrumSampler {
    pub fn new(receiver: Box<dyn Receiver>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    pub fn from_receiver(receiver: impl Receiver + 'static) -> Self {
        Self::new(Box::new(receiver))
    }

    /// Wait up to `timeout` for the receiver.
    ///
    /// Expiry returns [`ScanError::ResourceBusy`] and leaves nothing behind.
    pub async fn acquire(&self, timeout: Duration) -> Result<Lease, ScanError> {
        match tokio::time::timeout(timeout, self.receiver.clone().lock_owned()).await {
            Ok(guard) => {
                debug!(receiver = guard.name(), "lease acquired");
                Ok(Lease { guard })
            }
            Err(_) => Err(ScanError::ResourceBusy { timeout }),
        }
    }

    /// Take the lease only if nobody holds it right now.
    pub fn try_acquire(&self) -> Option<Lease> {
        self.receiver
            .clone()
            .try_lock_owned()
            .ok()
            .map(|guard| Lease { guard })
    }

    /// Close the underlying device, waiting for any outstanding lease.
    pub async fn close(&self) -> anyhow::Result<()> {
        let mut receiver = self.receiver.lock().await;
        receiver.close().await.context("Failed to close receiver")
    }
}

/// Scoped ownership of the receiver.
///
/// Dropping the lease releases the receiver, so every exit path (including
/// `?` and task cancellation) gives it back.
pub struct Lease {
    guard: OwnedMutexGuard<Box<dyn Receiver>>,
}

impl Lease {
    pub fn receiver_name(&self) -> &str {
        self.guard.name()
    }

    /// Tune to `frequency_mhz`, set the rate and AGC, and read exactly
    /// `sample_count` samples.
    pub async fn tune_and_read(
        &mut self,
        frequency_mhz: f64,
        sample_rate: f64,
        sample_count: usize,
    ) -> Result<SampleBlock, ScanError> {
        let frequency_hz = frequency_mhz * 1e6;
        let receiver = &mut **self.guard;

        let result: anyhow::Result<_> = async {
            receiver
                .set_sample_rate(sample_rate)
                .await
                .context("Failed to set sample rate")?;
            receiver
                .set_center_frequency(frequency_hz)
                .await
                .context("Failed to tune")?;
            receiver.set_gain_auto().await.context("Failed to enable AGC")?;
            let samples = receiver.read(sample_count).await.context("Failed to read samples")?;

            if samples.len() != sample_count {
                return Err(anyhow!("short read: {} of {} samples", samples.len(), sample_count));
            }
            Ok(samples)
        }
        .await;

        match result {
            Ok(samples) => Ok(SampleBlock::new(samples, sample_rate, frequency_hz)),
            Err(e) => {
                warn!(frequency_mhz, error = %e, "receiver read failed");
                Err(ScanError::device_fault(frequency_mhz, e))
            }
        }
    }

    /// Give the receiver back. Equivalent to dropping the lease.
    pub fn release(self) {
        debug!(receiver = self.guard.name(), "lease released");
    }
}
