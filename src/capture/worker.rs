use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::{CaptureRequest, CaptureStore};
use crate::error::ScanError;
use crate::events::{EventRecord, EventSender};
use crate::hal::SpectrumSampler;

/// Consumes capture requests one at a time, leasing the receiver for each.
pub struct CaptureWorker {
    sampler: SpectrumSampler,
    store: Arc<dyn CaptureStore>,
    lease_timeout: Duration,
    events: Option<EventSender>,
    default_tag: String,
}

impl CaptureWorker {
    pub fn new(sampler: SpectrumSampler, store: Arc<dyn CaptureStore>, lease_timeout: Duration) -> Self {
        Self {
            sampler,
            store,
            lease_timeout,
            events: None,
            default_tag: "unclassified".to_string(),
        }
    }

    /// Record an event for every successful capture.
    pub fn with_events(mut self, events: EventSender, default_tag: impl Into<String>) -> Self {
        self.events = Some(events);
        self.default_tag = default_tag.into();
        self
    }

    /// Perform one capture and return where the bytes went.
    pub async fn capture(&self, request: &CaptureRequest) -> Result<String, ScanError> {
        let mut lease = self.sampler.acquire(self.lease_timeout).await?;
        let block = lease
            .tune_and_read(request.frequency_mhz(), request.sample_rate, request.sample_count)
            .await?;
        lease.release();

        let captured_at = Utc::now();
        let location = self
            .store
            .store(request, captured_at, block.to_complex64_bytes())
            .await
            .map_err(ScanError::Capture)?;

        info!(
            frequency_mhz = request.frequency_mhz(),
            samples = block.len(),
            path = %location,
            "capture stored"
        );

        if let Some(events) = &self.events {
            let record = EventRecord::from_capture(request, Some(location.clone()), self.default_tag.as_str(), captured_at);
            if let Err(e) = events.send(record) {
                warn!(error = %e, "capture event dropped");
            }
        }

        Ok(location)
    }

    /// Serve requests until every sender is dropped.
    pub async fn run(self, mut requests: mpsc::Receiver<CaptureRequest>) {
        while let Some(request) = requests.recv().await {
            match self.capture(&request).await {
                Ok(_) => {}
                Err(e) if e.is_busy() => {
                    warn!(frequency_mhz = request.frequency_mhz(), error = %e, "capture skipped");
                }
                Err(e) => {
                    error!(frequency_mhz = request.frequency_mhz(), error = %e, "capture failed");
                }
            }
        }
        info!("capture worker stopped");
    }
}
