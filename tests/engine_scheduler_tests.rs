use rfwatch::capture::CaptureReason;
use rfwatch::core::{ChannelList, FrequencyChannel};
use rfwatch::engine::ScanScheduler;
use rfwatch::hal::mock::{SimulatedReceiver, ToneProfile};
use rfwatch::hal::SpectrumSampler;
use rfwatch::visualization::TimeSeriesBuffer;
use rfwatch::{ScanError, ScannerConfig};
use chrono::Utc;
use serde_json::json;
use std::time::Duration;

const SAMPLE_COUNT: usize = 4096;

fn config(channels: &[f64], capture_threshold: Option<f64>) -> ScannerConfig {
    ScannerConfig::from_json(json!({
        "channels_mhz": channels,
        "sample_count": SAMPLE_COUNT,
        "lease_timeout_ms": 100,
        "capture": { "score_threshold": capture_threshold }
    }))
    .unwrap()
}

fn ch(mhz: f64) -> FrequencyChannel {
    FrequencyChannel::from_mhz(mhz)
}

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} +/- {}, got {}",
        expected,
        tolerance,
        actual
    );
}

#[tokio::test]
async fn test_sweep_with_faulted_channel() {
    let receiver = SimulatedReceiver::new()
        .with_profile(30.0, ToneProfile::new(-50.0, 150e3))
        .with_fault(136.0);
    let scheduler = ScanScheduler::new(&config(&[30.0, 136.0], None), SpectrumSampler::from_receiver(receiver));
    let mut buffer = scheduler.new_buffer(60);

    let report = scheduler.run_cycle(&mut buffer).await.unwrap();

    assert_eq!(report.row.powers.len(), 2);
    assert_close(report.row.powers[0].unwrap(), -50.0, 1e-3);
    assert_eq!(report.row.powers[1], None);

    let bin_width = 2.4e6 / SAMPLE_COUNT as f64;
    assert_eq!(report.measurements.len(), 1);
    assert_close(report.measurements[0].bandwidth_hz, 150e3, 2.0 * bin_width);

    assert_close(scheduler.baselines().get(ch(30.0)).unwrap(), -50.0, 1e-3);
    assert_eq!(scheduler.baselines().get(ch(136.0)), None);

    assert_eq!(report.scores.len(), 1);
    assert_eq!(report.scores[0].baseline_db, None);
    assert_eq!(report.scores[0].score, 0.0);

    assert_eq!(buffer.len(), 1);
    assert_eq!(scheduler.metrics().channel_faults(), 1);
    assert_eq!(scheduler.metrics().sweeps_completed(), 1);
}

#[tokio::test]
async fn test_busy_cycle_leaves_buffer_untouched() {
    let sampler = SpectrumSampler::from_receiver(SimulatedReceiver::new());
    let scheduler = ScanScheduler::new(&config(&[30.0, 136.0], None), sampler.clone());

    let mut buffer = scheduler.new_buffer(60);
    scheduler.run_cycle(&mut buffer).await.unwrap();
    let before = buffer.clone();
    let before_json = serde_json::to_vec(&buffer).unwrap();
    let baselines_before = scheduler.baselines().snapshot();

    let _held = sampler.acquire(Duration::from_millis(100)).await.unwrap();
    let result = scheduler.run_cycle(&mut buffer).await;

    assert!(matches!(result, Err(ScanError::ResourceBusy { .. })));
    assert_eq!(buffer, before);
    assert_eq!(serde_json::to_vec(&buffer).unwrap(), before_json);
    assert_eq!(scheduler.baselines().snapshot(), baselines_before);
    assert_eq!(scheduler.metrics().sweeps_skipped(), 1);
}

#[tokio::test]
async fn test_spike_is_scored_against_previous_baseline() {
    let receiver = SimulatedReceiver::new().with_profile(30.0, ToneProfile::new(-40.0, 150e3));
    let controls = receiver.controls();
    let scheduler = ScanScheduler::new(&config(&[30.0], None), SpectrumSampler::from_receiver(receiver));
    let mut buffer = scheduler.new_buffer(60);

    scheduler.run_cycle(&mut buffer).await.unwrap();

    controls.set_profile(30.0, ToneProfile::new(-38.0, 150e3));
    let report = scheduler.run_cycle(&mut buffer).await.unwrap();

    // delta 2 dB over a 4 dB margin; the post-update baseline would give 0.32
    assert_close(report.scores[0].baseline_db.unwrap(), -40.0, 1e-3);
    assert_eq!(report.scores[0].score, 0.35);
    assert_close(scheduler.baselines().get(ch(30.0)).unwrap(), -39.8, 1e-3);
    assert_eq!(scheduler.baselines().baseline(ch(30.0)).unwrap().sample_count, 2);
}

#[tokio::test]
async fn test_rows_follow_scan_order() {
    let receiver = SimulatedReceiver::new()
        .with_profile(136.0, ToneProfile::new(-70.0, 150e3))
        .with_profile(30.0, ToneProfile::new(-30.0, 150e3));
    let scheduler = ScanScheduler::new(&config(&[136.0, 30.0], None), SpectrumSampler::from_receiver(receiver));
    let mut buffer = scheduler.new_buffer(60);

    let report = scheduler.run_cycle(&mut buffer).await.unwrap();

    assert_close(report.row.powers[0].unwrap(), -70.0, 1e-3);
    assert_close(report.row.powers[1].unwrap(), -30.0, 1e-3);
    assert_eq!(buffer.channels(), &[ch(136.0), ch(30.0)]);
}

#[tokio::test]
async fn test_mismatched_buffer_is_rebuilt() {
    let scheduler = ScanScheduler::new(
        &config(&[30.0, 136.0], None),
        SpectrumSampler::from_receiver(SimulatedReceiver::new()),
    );

    let mut buffer = TimeSeriesBuffer::new(&ChannelList::from_mhz(&[30.0, 32.5]), 60);
    buffer.append(Utc::now(), vec![Some(-10.0), Some(-20.0)]).unwrap();
    buffer.append(Utc::now(), vec![Some(-10.0), Some(-20.0)]).unwrap();

    scheduler.run_cycle(&mut buffer).await.unwrap();

    assert!(buffer.matches_channels(scheduler.channels()));
    assert_eq!(buffer.len(), 1);
    buffer.validate().unwrap();
}

#[tokio::test]
async fn test_sustained_anomaly_requests_one_capture() {
    let receiver = SimulatedReceiver::new().with_profile(30.0, ToneProfile::new(-40.0, 150e3));
    let controls = receiver.controls();
    let scheduler = ScanScheduler::new(&config(&[30.0], Some(0.5)), SpectrumSampler::from_receiver(receiver));
    let mut buffer = scheduler.new_buffer(60);

    let quiet = scheduler.run_cycle(&mut buffer).await.unwrap();
    assert!(quiet.capture_requests.is_empty());

    controls.set_profile(30.0, ToneProfile::new(-20.0, 150e3));
    let spike = scheduler.run_cycle(&mut buffer).await.unwrap();
    assert_eq!(spike.scores[0].score, 0.7);
    assert_eq!(spike.capture_requests.len(), 1);

    let request = spike.capture_requests[0];
    assert_eq!(request.channel, ch(30.0));
    assert_eq!(request.sample_count, 2_560_000);
    assert!(matches!(request.reason, CaptureReason::CompositeScore { score, .. } if score == 0.7));

    let sustained = scheduler.run_cycle(&mut buffer).await.unwrap();
    assert!(sustained.scores[0].score >= 0.5);
    assert!(sustained.capture_requests.is_empty());

    assert_eq!(scheduler.metrics().capture_requests(), 1);
}

#[tokio::test]
async fn test_no_capture_without_threshold() {
    let receiver = SimulatedReceiver::new().with_profile(30.0, ToneProfile::new(-40.0, 150e3));
    let controls = receiver.controls();
    let scheduler = ScanScheduler::new(&config(&[30.0], None), SpectrumSampler::from_receiver(receiver));
    let mut buffer = scheduler.new_buffer(60);

    scheduler.run_cycle(&mut buffer).await.unwrap();
    controls.set_profile(30.0, ToneProfile::new(0.0, 1e6));
    let report = scheduler.run_cycle(&mut buffer).await.unwrap();

    assert_eq!(report.scores[0].score, 1.0);
    assert!(report.capture_requests.is_empty());
}

fn delayed_scheduler(read_delay_ms: u64) -> ScanScheduler {
    let config = ScannerConfig::from_json(json!({
        "channels_mhz": [30.0, 136.0],
        "sample_count": 1024,
        "lease_timeout_ms": 1000
    }))
    .unwrap();
    let receiver = SimulatedReceiver::new().with_read_delay(Duration::from_millis(read_delay_ms));
    ScanScheduler::new(&config, SpectrumSampler::from_receiver(receiver))
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_sweeps_serialize_on_lease() {
    // One sweep holds the lease for 2 x 100 ms, well inside the 1 s timeout
    let scheduler = delayed_scheduler(100);

    let (first, second) = tokio::join!(scheduler.sweep(), scheduler.sweep());
    assert!(first.is_ok());
    assert!(second.is_ok());

    for mhz in [30.0, 136.0] {
        assert_eq!(scheduler.baselines().baseline(ch(mhz)).unwrap().sample_count, 2);
    }
    assert_eq!(scheduler.metrics().sweeps_skipped(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_sweep_skips_when_lease_held_too_long() {
    // One sweep holds the lease for 2 x 600 ms, past the 1 s timeout
    let scheduler = delayed_scheduler(600);

    let (first, second) = tokio::join!(scheduler.sweep(), scheduler.sweep());
    let results = [first, second];

    let busy = results
        .iter()
        .filter(|r| matches!(r, Err(ScanError::ResourceBusy { .. })))
        .count();
    assert_eq!(busy, 1);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

    for mhz in [30.0, 136.0] {
        assert_eq!(scheduler.baselines().baseline(ch(mhz)).unwrap().sample_count, 1);
    }
    assert_eq!(scheduler.metrics().sweeps_skipped(), 1);
}

#[tokio::test]
async fn test_empty_channel_list_publishes_empty_row() {
    let config = ScannerConfig {
        channels_mhz: Vec::new(),
        sample_count: SAMPLE_COUNT,
        ..ScannerConfig::default()
    };
    let scheduler = ScanScheduler::new(&config, SpectrumSampler::from_receiver(SimulatedReceiver::new()));
    let mut buffer = scheduler.new_buffer(60);

    let report = scheduler.run_cycle(&mut buffer).await.unwrap();

    assert!(report.row.powers.is_empty());
    assert!(report.scores.is_empty());
    assert_eq!(buffer.len(), 1);
    buffer.validate().unwrap();
}
