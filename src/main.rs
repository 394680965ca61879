use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use rfwatch::analysis::LiveMonitor;
use rfwatch::capture::{CaptureRequest, CaptureWorker, FileCaptureStore};
use rfwatch::engine::{ScanRunner, ScanScheduler};
use rfwatch::events::{EventRecorder, JsonLinesEventLog};
use rfwatch::hal::mock::SimulatedReceiver;
use rfwatch::hal::{Receiver, SpectrumSampler};
use rfwatch::logging::init_logging;
use rfwatch::observability::{ScanMetrics, ScanMonitor};
use rfwatch::ScannerConfig;

const CAPTURE_QUEUE: usize = 16;
const EVENT_QUEUE: usize = 256;

#[derive(Parser, Debug)]
#[clap(name = "rfwatch", about = "Sweep a channel list and score it for jamming")]
struct Cli {
    /// JSON configuration file; defaults are used if it does not exist
    #[arg(long, default_value = "rfwatch.json")]
    config: PathBuf,

    /// Log level for the rfwatch target (RUST_LOG overrides)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Use the simulated receiver instead of hardware
    #[arg(long, action)]
    simulate: bool,

    /// Also run the single-channel live monitor
    #[arg(long, action)]
    monitor: bool,
}

#[cfg(feature = "rtlsdr")]
fn open_receiver(simulate: bool) -> Result<Box<dyn Receiver>> {
    if simulate {
        return Ok(Box::new(SimulatedReceiver::new()));
    }
    let receiver = rfwatch::hal::rtl::RtlReceiver::open(0)?;
    Ok(Box::new(receiver))
}

#[cfg(not(feature = "rtlsdr"))]
fn open_receiver(simulate: bool) -> Result<Box<dyn Receiver>> {
    if !simulate {
        warn!("built without rtlsdr support, using simulated receiver");
    }
    Ok(Box::new(SimulatedReceiver::new()))
}

async fn run_monitor(
    monitor: LiveMonitor,
    config: ScannerConfig,
    captures: mpsc::Sender<CaptureRequest>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(config.scan_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match monitor.poll(config.monitor.center_mhz, config.monitor.threshold_db).await {
                    Ok(reading) => {
                        if let Some(request) = reading.capture {
                            if let Err(e) = captures.try_send(request) {
                                warn!(error = %e, "monitor capture request dropped");
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "monitor poll failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = ScannerConfig::load(&cli.config)?;
    info!(
        channels = config.channels_mhz.len(),
        sample_rate = config.sample_rate,
        interval_ms = config.scan_interval_ms,
        "configuration loaded"
    );

    let sampler = SpectrumSampler::new(open_receiver(cli.simulate)?);
    let metrics = Arc::new(ScanMetrics::new());

    let event_log = JsonLinesEventLog::open(&config.events.path)?;
    let recorder = EventRecorder::spawn(event_log, EVENT_QUEUE).context("Failed to start event recorder")?;

    let (capture_tx, capture_rx) = mpsc::channel(CAPTURE_QUEUE);
    let worker = CaptureWorker::new(
        sampler.clone(),
        Arc::new(FileCaptureStore::new(&config.capture.directory)),
        config.lease_timeout(),
    )
    .with_events(recorder.sender(), config.events.default_tag.clone());
    let worker_task = tokio::spawn(worker.run(capture_rx));

    let scheduler = Arc::new(ScanScheduler::new(&config, sampler.clone()).with_metrics(metrics.clone()));
    let (runner, _outputs) = ScanRunner::new(scheduler, config.scan_interval(), config.history_len);
    let runner = runner.with_capture_channel(capture_tx.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner_task = tokio::spawn(runner.run(shutdown_rx.clone()));

    let monitor_task = cli.monitor.then(|| {
        let monitor = LiveMonitor::new(sampler.clone(), &config);
        tokio::spawn(run_monitor(monitor, config.clone(), capture_tx.clone(), shutdown_rx.clone()))
    });
    drop(capture_tx);

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    info!("shutting down");
    let _ = shutdown_tx.send(true);

    runner_task.await.context("Scan runner panicked")?;
    if let Some(task) = monitor_task {
        task.await.context("Live monitor panicked")?;
    }
    worker_task.await.context("Capture worker panicked")?;
    recorder.shutdown();

    info!("\n{}", ScanMonitor::new(metrics).report());
    sampler.close().await?;
    Ok(())
}
