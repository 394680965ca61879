use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::{ChannelList, FrequencyChannel, PowerReading, SweepRow};
use crate::error::ScanError;

pub const DEFAULT_HISTORY: usize = 60;

/// Rolling window of sweep rows backing the waterfall view.
///
/// Every successful mutation keeps `timestamps.len() == rows.len()` and every
/// row as long as `channels`. A buffer restored from elsewhere may not hold
/// these, so renderers go through [`TimeSeriesBuffer::validate`] first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesBuffer {
    channels: Vec<FrequencyChannel>,
    timestamps: VecDeque<DateTime<Utc>>,
    rows: VecDeque<Vec<PowerReading>>,
    capacity: usize,
}

impl TimeSeriesBuffer {
    pub fn new(channels: &ChannelList, capacity: usize) -> Self {
        Self {
            channels: channels.as_slice().to_vec(),
            timestamps: VecDeque::with_capacity(capacity + 1),
            rows: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Build from raw parts without checking them.
    pub fn from_parts(
        channels: Vec<FrequencyChannel>,
        timestamps: Vec<DateTime<Utc>>,
        rows: Vec<Vec<PowerReading>>,
        capacity: usize,
    ) -> Self {
        Self {
            channels,
            timestamps: timestamps.into(),
            rows: rows.into(),
            capacity,
        }
    }

    pub fn channels(&self) -> &[FrequencyChannel] {
        &self.channels
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.timestamps.iter()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Vec<PowerReading>> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn matches_channels(&self, channels: &ChannelList) -> bool {
        channels.matches(&self.channels)
    }

    /// Drop all history and adopt a new channel list.
    pub fn reset_to(&mut self, channels: &ChannelList) {
        self.channels = channels.as_slice().to_vec();
        self.timestamps.clear();
        self.rows.clear();
    }

    /// Push one row, evicting the oldest entries beyond capacity.
    ///
    /// A row of the wrong length is rejected and the buffer left as it was.
    pub fn append(&mut self, timestamp: DateTime<Utc>, row: Vec<PowerReading>) -> Result<(), ScanError> {
        if row.len() != self.channels.len() {
            return Err(ScanError::InvariantViolation(format!(
                "row has {} readings for {} channels",
                row.len(),
                self.channels.len()
            )));
        }

        self.timestamps.push_back(timestamp);
        self.rows.push_back(row);

        while self.rows.len() > self.capacity {
            self.timestamps.pop_front();
            self.rows.pop_front();
        }
        Ok(())
    }

    pub fn push_row(&mut self, row: SweepRow) -> Result<(), ScanError> {
        self.append(row.timestamp, row.powers)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.timestamps.len() != self.rows.len() {
            return Err(ScanError::InvariantViolation(format!(
                "{} timestamps for {} rows",
                self.timestamps.len(),
                self.rows.len()
            )));
        }
        if let Some((i, row)) = self.rows.iter().enumerate().find(|(_, r)| r.len() != self.channels.len()) {
            return Err(ScanError::InvariantViolation(format!(
                "row {} has {} readings for {} channels",
                i,
                row.len(),
                self.channels.len()
            )));
        }
        if self.rows.len() > self.capacity {
            return Err(ScanError::InvariantViolation(format!(
                "{} rows exceed capacity {}",
                self.rows.len(),
                self.capacity
            )));
        }
        Ok(())
    }
}

/// Render-ready waterfall: one line of powers per channel, oldest sample first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterfallFrame {
    pub channels_mhz: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
    /// `z[channel][time]`
    pub z: Vec<Vec<PowerReading>>,
}

impl WaterfallFrame {
    /// `Ok(None)` for an empty buffer; malformed buffers are refused whole.
    pub fn from_buffer(buffer: &TimeSeriesBuffer) -> Result<Option<Self>, ScanError> {
        buffer.validate()?;
        if buffer.is_empty() {
            return Ok(None);
        }

        let z = (0..buffer.channels.len())
            .map(|c| buffer.rows.iter().map(|row| row[c]).collect())
            .collect();

        Ok(Some(Self {
            channels_mhz: buffer.channels.iter().map(|c| c.mhz()).collect(),
            timestamps: buffer.timestamps.iter().copied().collect(),
            z,
        }))
    }
}
