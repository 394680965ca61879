use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use super::ScanState;
use crate::analysis::{BaselineTracker, CompositeTrigger, JammingScorer};
use crate::capture::CaptureRequest;
use crate::config::ScannerConfig;
use crate::core::{ChannelList, FrequencyChannel, PowerReading, SpectralMeasurement, SweepRow};
use crate::dsp::PowerEstimator;
use crate::error::ScanError;
use crate::hal::SpectrumSampler;
use crate::observability::ScanMetrics;
use crate::visualization::TimeSeriesBuffer;

/// Score of one measured channel in one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelScore {
    pub channel: FrequencyChannel,
    /// Baseline the score was judged against, before this sweep folded in.
    pub baseline_db: Option<f64>,
    pub score: f64,
}

/// A measured and scored sweep that has not been published yet.
#[derive(Debug)]
pub struct Sweep {
    pub timestamp: DateTime<Utc>,
    /// One entry per channel in scan order; `None` where the read failed.
    pub readings: Vec<Option<SpectralMeasurement>>,
    pub scores: Vec<ChannelScore>,
    pub capture_requests: Vec<CaptureRequest>,
    state: ScanState,
    started: Instant,
}

impl Sweep {
    pub fn row(&self) -> SweepRow {
        SweepRow {
            timestamp: self.timestamp,
            powers: self
                .readings
                .iter()
                .map(|r| r.map(|m| m.power_db))
                .collect::<Vec<PowerReading>>(),
        }
    }

    pub fn measurements(&self) -> Vec<SpectralMeasurement> {
        self.readings.iter().flatten().copied().collect()
    }
}

/// Outcome of a published sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub row: SweepRow,
    pub measurements: Vec<SpectralMeasurement>,
    pub scores: Vec<ChannelScore>,
    pub capture_requests: Vec<CaptureRequest>,
}

/// Runs sweep cycles over the fixed channel list.
pub struct ScanScheduler {
    channels: ChannelList,
    sampler: SpectrumSampler,
    lease_timeout: Duration,
    sample_rate: f64,
    sample_count: usize,
    estimator: PowerEstimator,
    baselines: Arc<BaselineTracker>,
    scorer: JammingScorer,
    trigger: CompositeTrigger,
    metrics: Arc<ScanMetrics>,
}

impl ScanScheduler {
    pub fn new(config: &ScannerConfig, sampler: SpectrumSampler) -> Self {
        let baselines = Arc::new(BaselineTracker::new(config.baseline_alpha));

        Self {
            channels: config.channel_list(),
            sampler,
            lease_timeout: config.lease_timeout(),
            sample_rate: config.sample_rate,
            sample_count: config.sample_count,
            estimator: PowerEstimator::new(config.detection_drop_db),
            scorer: JammingScorer::new(config.scoring, baselines.clone()),
            baselines,
            trigger: CompositeTrigger::new(
                config.capture.score_threshold,
                config.sample_rate,
                config.capture.sample_count,
            ),
            metrics: Arc::new(ScanMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ScanMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn channels(&self) -> &ChannelList {
        &self.channels
    }

    pub fn baselines(&self) -> &Arc<BaselineTracker> {
        &self.baselines
    }

    pub fn metrics(&self) -> &Arc<ScanMetrics> {
        &self.metrics
    }

    /// An empty buffer sized for this scheduler's channel list.
    pub fn new_buffer(&self, capacity: usize) -> TimeSeriesBuffer {
        TimeSeriesBuffer::new(&self.channels, capacity)
    }

    /// Acquire, measure every channel and score the results.
    ///
    /// Returns [`ScanError::ResourceBusy`] without touching any state when the
    /// receiver cannot be leased in time.
    pub async fn sweep(&self) -> Result<Sweep, ScanError> {
        let started = self.metrics.start_sweep();
        let mut state = ScanState::Idle;

        advance(&mut state, ScanState::Acquiring)?;
        let mut lease = match self.sampler.acquire(self.lease_timeout).await {
            Ok(lease) => lease,
            Err(e) => {
                advance(&mut state, ScanState::Idle)?;
                self.metrics.record_sweep_skipped();
                warn!(error = %e, "sweep skipped");
                return Err(e);
            }
        };

        let timestamp = Utc::now();
        let mut readings = Vec::with_capacity(self.channels.len());
        for (index, &channel) in self.channels.iter().enumerate() {
            advance(&mut state, ScanState::Scanning { index })?;

            match lease
                .tune_and_read(channel.mhz(), self.sample_rate, self.sample_count)
                .await
            {
                Ok(block) => {
                    let estimate = self.estimator.estimate(&block.samples, block.sample_rate);
                    readings.push(Some(SpectralMeasurement {
                        channel,
                        power_db: estimate.power_db,
                        bandwidth_hz: estimate.occupied_bandwidth_hz,
                    }));
                }
                Err(_) => {
                    self.metrics.record_channel_fault();
                    readings.push(None);
                }
            }
        }
        lease.release();

        advance(&mut state, ScanState::Scoring)?;
        let mut scores = Vec::with_capacity(readings.len());
        let mut capture_requests = Vec::new();
        for measurement in readings.iter().flatten() {
            let update = self.baselines.observe(measurement.channel, measurement.power_db);
            let score = self
                .scorer
                .score_against(update.previous, measurement.power_db, measurement.bandwidth_hz);

            debug!(
                frequency_mhz = measurement.channel.mhz(),
                power_db = measurement.power_db,
                delta_db = update.previous.map(|b| measurement.power_db - b),
                bandwidth_hz = measurement.bandwidth_hz,
                score,
                "channel scored"
            );

            scores.push(ChannelScore {
                channel: measurement.channel,
                baseline_db: update.previous,
                score,
            });
            if let Some(request) = self.trigger.evaluate(measurement, score) {
                info!(frequency_mhz = request.frequency_mhz(), score, "capture requested");
                capture_requests.push(request);
            }
        }

        Ok(Sweep {
            timestamp,
            readings,
            scores,
            capture_requests,
            state,
            started,
        })
    }

    /// Append a sweep to `buffer`, rebuilding the buffer first if it was made
    /// for a different channel list.
    pub fn publish(&self, mut sweep: Sweep, buffer: &mut TimeSeriesBuffer) -> Result<SweepReport, ScanError> {
        advance(&mut sweep.state, ScanState::Publishing)?;

        if !buffer.matches_channels(&self.channels) {
            warn!(
                error = %ScanError::StateMismatch,
                buffered = buffer.channels().len(),
                configured = self.channels.len(),
                "resetting time-series buffer"
            );
            buffer.reset_to(&self.channels);
        }

        let row = sweep.row();
        buffer.append(row.timestamp, row.powers.clone())?;

        self.metrics.record_capture_requests(sweep.capture_requests.len());
        self.metrics.finish_sweep(sweep.started);
        advance(&mut sweep.state, ScanState::Idle)?;

        if row.missing_count() > 0 {
            debug!(missing = row.missing_count(), "sweep published with missing channels");
        }

        Ok(SweepReport {
            measurements: sweep.measurements(),
            row,
            scores: sweep.scores,
            capture_requests: sweep.capture_requests,
        })
    }

    /// One full cycle. On `Busy` the buffer is left exactly as it was.
    pub async fn run_cycle(&self, buffer: &mut TimeSeriesBuffer) -> Result<SweepReport, ScanError> {
        let sweep = self.sweep().await?;
        self.publish(sweep, buffer)
    }
}

fn advance(state: &mut ScanState, next: ScanState) -> Result<(), ScanError> {
    if !state.can_transition_to(&next) {
        return Err(ScanError::InvariantViolation(format!(
            "invalid scan transition {} -> {}",
            state.name(),
            next.name()
        )));
    }
    trace!(from = state.name(), to = next.name(), "scan state");
    *state = next;
    Ok(())
}
