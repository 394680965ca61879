use crossbeam_channel::{bounded, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

use super::{EventRecord, EventSink};
use crate::error::ScanError;

/// Runs an [`EventSink`] on its own thread so disk I/O never stalls a scan.
pub struct EventRecorder {
    tx: Sender<EventRecord>,
    handle: Option<JoinHandle<()>>,
}

/// Cloneable producer side of an [`EventRecorder`].
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<EventRecord>,
}

impl EventSender {
    /// Queue an event without blocking.
    pub fn send(&self, event: EventRecord) -> Result<(), ScanError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => ScanError::Persistence(anyhow::anyhow!("event queue full")),
            TrySendError::Disconnected(_) => ScanError::Persistence(anyhow::anyhow!("event recorder stopped")),
        })
    }
}

impl EventRecorder {
    pub fn spawn(mut sink: impl EventSink + 'static, capacity: usize) -> std::io::Result<Self> {
        let (tx, rx) = bounded::<EventRecord>(capacity);

        let handle = thread::Builder::new()
            .name("event-recorder".to_string())
            .spawn(move || {
                for event in rx {
                    match sink.record(&event) {
                        Ok(()) => debug!(frequency_mhz = event.frequency_mhz, tag = %event.tag, "event recorded"),
                        Err(e) => error!(error = %e, "failed to record event"),
                    }
                }
            })?;

        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    pub fn sender(&self) -> EventSender {
        EventSender { tx: self.tx.clone() }
    }

    /// Drain queued events and stop the thread.
    ///
    /// Returns once every [`EventSender`] has been dropped.
    pub fn shutdown(mut self) {
        let handle = self.handle.take();
        drop(self);
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("event recorder thread panicked");
            }
        }
    }
}
