use std::time::Duration;
use thiserror::Error;

/// Recoverable failures of the scanning core.
///
/// None of these are fatal; callers log them and carry on with the next
/// cycle, channel or request.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The receiver lease was not obtained in time; skip this cycle.
    #[error("receiver busy, no lease within {timeout:?}")]
    ResourceBusy { timeout: Duration },

    #[error("device fault at {frequency_mhz:.2} MHz: {source}")]
    DeviceFault {
        frequency_mhz: f64,
        #[source]
        source: anyhow::Error,
    },

    #[error("buffer channel list does not match the scan list")]
    StateMismatch,

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("capture failed: {0}")]
    Capture(#[source] anyhow::Error),

    #[error("event persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl ScanError {
    pub fn device_fault(frequency_mhz: f64, source: impl Into<anyhow::Error>) -> Self {
        Self::DeviceFault {
            frequency_mhz,
            source: source.into(),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::ResourceBusy { .. })
    }
}
