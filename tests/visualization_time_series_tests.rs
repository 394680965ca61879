use chrono::{DateTime, TimeZone, Utc};
use rfwatch::core::{ChannelList, SweepRow};
use rfwatch::visualization::{TimeSeriesBuffer, WaterfallFrame, DEFAULT_HISTORY};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[test]
fn test_fifo_eviction_at_capacity() {
    let channels = ChannelList::from_mhz(&[30.0, 136.0]);
    let mut buffer = TimeSeriesBuffer::new(&channels, DEFAULT_HISTORY);

    for i in 0..61 {
        buffer.append(at(i), vec![Some(i as f64), None]).unwrap();
        assert_eq!(buffer.timestamps().count(), buffer.rows().count());
        buffer.validate().unwrap();
    }

    assert_eq!(buffer.len(), 60);
    assert_eq!(buffer.timestamps().next(), Some(&at(1)));
    assert_eq!(buffer.rows().next().unwrap()[0], Some(1.0));
    assert_eq!(buffer.rows().last().unwrap()[0], Some(60.0));
}

#[test]
fn test_push_row_and_reset() {
    let channels = ChannelList::from_mhz(&[30.0]);
    let mut buffer = TimeSeriesBuffer::new(&channels, 3);

    buffer
        .push_row(SweepRow {
            timestamp: at(0),
            powers: vec![Some(-50.0)],
        })
        .unwrap();
    assert_eq!(buffer.len(), 1);

    let wider = ChannelList::from_mhz(&[30.0, 32.5]);
    assert!(!buffer.matches_channels(&wider));

    buffer.reset_to(&wider);
    assert!(buffer.is_empty());
    assert!(buffer.matches_channels(&wider));
    assert_eq!(buffer.capacity(), 3);
}

#[test]
fn test_waterfall_after_eviction() {
    let channels = ChannelList::from_mhz(&[30.0, 136.0]);
    let mut buffer = TimeSeriesBuffer::new(&channels, 2);

    buffer.append(at(0), vec![Some(-1.0), Some(-10.0)]).unwrap();
    buffer.append(at(5), vec![Some(-2.0), None]).unwrap();
    buffer.append(at(10), vec![Some(-3.0), Some(-30.0)]).unwrap();

    let frame = WaterfallFrame::from_buffer(&buffer).unwrap().unwrap();
    assert_eq!(frame.timestamps, vec![at(5), at(10)]);
    assert_eq!(frame.z, vec![vec![Some(-2.0), Some(-3.0)], vec![None, Some(-30.0)]]);
}
