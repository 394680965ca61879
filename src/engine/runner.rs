use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::ScanScheduler;
use crate::capture::CaptureRequest;
use crate::core::SpectralMeasurement;
use crate::visualization::TimeSeriesBuffer;

/// Read side of the runner for the visualization collaborator.
#[derive(Clone)]
pub struct ScanOutputs {
    pub buffer: watch::Receiver<TimeSeriesBuffer>,
    pub measurements: watch::Receiver<Vec<SpectralMeasurement>>,
}

/// Drives the scheduler from a periodic timer.
pub struct ScanRunner {
    scheduler: Arc<ScanScheduler>,
    interval: Duration,
    buffer: Arc<Mutex<TimeSeriesBuffer>>,
    buffer_tx: Arc<watch::Sender<TimeSeriesBuffer>>,
    measurements_tx: Arc<watch::Sender<Vec<SpectralMeasurement>>>,
    captures: Option<mpsc::Sender<CaptureRequest>>,
}

impl ScanRunner {
    pub fn new(scheduler: Arc<ScanScheduler>, interval: Duration, history_len: usize) -> (Self, ScanOutputs) {
        let buffer = scheduler.new_buffer(history_len);
        let (buffer_tx, buffer_rx) = watch::channel(buffer.clone());
        let (measurements_tx, measurements_rx) = watch::channel(Vec::new());

        let runner = Self {
            scheduler,
            interval,
            buffer: Arc::new(Mutex::new(buffer)),
            buffer_tx: Arc::new(buffer_tx),
            measurements_tx: Arc::new(measurements_tx),
            captures: None,
        };
        let outputs = ScanOutputs {
            buffer: buffer_rx,
            measurements: measurements_rx,
        };
        (runner, outputs)
    }

    /// Forward capture requests to a worker.
    pub fn with_capture_channel(mut self, captures: mpsc::Sender<CaptureRequest>) -> Self {
        self.captures = Some(captures);
        self
    }

    /// Tick until `shutdown` turns true or its sender is dropped, then wait
    /// for in-flight cycles.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut cycles = JoinSet::new();
        info!(interval_ms = self.interval.as_millis() as u64, "scan runner started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Overlapping cycles serialize on the receiver lease
                    cycles.spawn(run_cycle(
                        self.scheduler.clone(),
                        self.buffer.clone(),
                        self.buffer_tx.clone(),
                        self.measurements_tx.clone(),
                        self.captures.clone(),
                    ));
                    reap_finished(&mut cycles);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        drain(&mut cycles).await;
        info!("scan runner stopped");
    }
}

/// Collect cycles that already finished. Returns how many failed.
fn reap_finished(cycles: &mut JoinSet<()>) -> usize {
    let mut failed = 0;
    while let Some(result) = cycles.try_join_next() {
        failed += log_cycle_result(result);
    }
    failed
}

/// Wait for every outstanding cycle. Returns how many failed.
async fn drain(cycles: &mut JoinSet<()>) -> usize {
    let mut failed = 0;
    while let Some(result) = cycles.join_next().await {
        failed += log_cycle_result(result);
    }
    failed
}

fn log_cycle_result(result: Result<(), JoinError>) -> usize {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "scan cycle task failed");
            1
        }
    }
}

async fn run_cycle(
    scheduler: Arc<ScanScheduler>,
    buffer: Arc<Mutex<TimeSeriesBuffer>>,
    buffer_tx: Arc<watch::Sender<TimeSeriesBuffer>>,
    measurements_tx: Arc<watch::Sender<Vec<SpectralMeasurement>>>,
    captures: Option<mpsc::Sender<CaptureRequest>>,
) {
    let sweep = match scheduler.sweep().await {
        Ok(sweep) => sweep,
        // Already logged and counted by the scheduler
        Err(e) if e.is_busy() => return,
        Err(e) => {
            error!(error = %e, "sweep aborted");
            return;
        }
    };

    let report = {
        let mut buffer = buffer.lock().await;
        match scheduler.publish(sweep, &mut buffer) {
            Ok(report) => {
                buffer_tx.send_replace(buffer.clone());
                report
            }
            Err(e) => {
                error!(error = %e, "sweep dropped");
                return;
            }
        }
    };

    measurements_tx.send_replace(report.measurements);

    if let Some(captures) = captures {
        for request in report.capture_requests {
            if let Err(e) = captures.try_send(request) {
                warn!(frequency_mhz = request.frequency_mhz(), error = %e, "capture request dropped");
            }
        }
    }
}
