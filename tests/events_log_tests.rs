use chrono::{TimeZone, Utc};
use rfwatch::capture::{CaptureReason, CaptureRequest};
use rfwatch::core::FrequencyChannel;
use rfwatch::events::{EventRecord, EventRecorder, EventSink, JsonLinesEventLog};
use tempfile::TempDir;

fn monitor_request() -> CaptureRequest {
    CaptureRequest {
        channel: FrequencyChannel::from_mhz(100.0),
        sample_rate: 2.4e6,
        sample_count: 2_560_000,
        reason: CaptureReason::LiveMonitor {
            score_db: 72.5,
            threshold_db: 60.0,
        },
    }
}

#[test]
fn test_record_from_live_monitor_capture() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let record = EventRecord::from_capture(&monitor_request(), None, "unclassified", at);

    assert_eq!(record.timestamp, at);
    assert_eq!(record.frequency_mhz, 100.0);
    assert_eq!(record.peak_power_db, 72.5);
    assert_eq!(record.bandwidth_hz, 0.0);
    assert_eq!(record.iq_path, None);
}

#[test]
fn test_log_appends_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("events.jsonl");
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    {
        let mut log = JsonLinesEventLog::open(&path).unwrap();
        log.record(&EventRecord::from_capture(&monitor_request(), Some("a.bin".into()), "unclassified", at))
            .unwrap();
    }
    {
        let mut log = JsonLinesEventLog::open(&path).unwrap();
        assert_eq!(log.path(), path.as_path());
        log.record(&EventRecord::from_capture(&monitor_request(), Some("b.bin".into()), "jammer", at))
            .unwrap();
    }

    let records = JsonLinesEventLog::read_all(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].iq_path.as_deref(), Some("a.bin"));
    assert_eq!(records[1].tag, "jammer");
}

#[test]
fn test_read_all_skips_garbage_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let mut log = JsonLinesEventLog::open(&path).unwrap();
    log.record(&EventRecord::from_capture(&monitor_request(), None, "unclassified", at))
        .unwrap();
    drop(log);

    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{ not json\n");
    std::fs::write(&path, content).unwrap();

    assert_eq!(JsonLinesEventLog::read_all(&path).unwrap().len(), 1);
}

#[test]
fn test_recorder_drains_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");
    let recorder = EventRecorder::spawn(JsonLinesEventLog::open(&path).unwrap(), 64).unwrap();

    let sender = recorder.sender();
    for i in 0..20 {
        let request = CaptureRequest {
            channel: FrequencyChannel::from_mhz(30.0 + i as f64),
            ..monitor_request()
        };
        sender
            .send(EventRecord::from_capture(&request, None, "unclassified", Utc::now()))
            .unwrap();
    }
    drop(sender);
    recorder.shutdown();

    let records = JsonLinesEventLog::read_all(&path).unwrap();
    assert_eq!(records.len(), 20);
    assert_eq!(records[0].frequency_mhz, 30.0);
    assert_eq!(records[19].frequency_mhz, 49.0);
}
