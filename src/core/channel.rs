use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A scanned frequency, identified by its value in MHz.
///
/// Identity is the frequency rounded to the nearest hertz so that channels
/// can key hash maps even though the configured value is a float.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct FrequencyChannel {
    mhz: f64,
}

impl FrequencyChannel {
    pub fn from_mhz(mhz: f64) -> Self {
        Self { mhz }
    }

    pub fn mhz(&self) -> f64 {
        self.mhz
    }

    pub fn hz(&self) -> f64 {
        self.mhz * 1e6
    }

    fn identity(&self) -> i64 {
        self.hz().round() as i64
    }
}

impl From<f64> for FrequencyChannel {
    fn from(mhz: f64) -> Self {
        Self::from_mhz(mhz)
    }
}

impl From<FrequencyChannel> for f64 {
    fn from(channel: FrequencyChannel) -> Self {
        channel.mhz
    }
}

impl PartialEq for FrequencyChannel {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for FrequencyChannel {}

impl Hash for FrequencyChannel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for FrequencyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} MHz", self.mhz)
    }
}

/// The ordered scan list.
///
/// Cloning is cheap and shares the same underlying list, so every component
/// that needs the channel order (scheduler, buffer validation, rendering)
/// holds a handle to one value instead of its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelList {
    channels: Arc<[FrequencyChannel]>,
}

impl ChannelList {
    pub fn new(channels: Vec<FrequencyChannel>) -> Self {
        Self {
            channels: channels.into(),
        }
    }

    pub fn from_mhz(frequencies: &[f64]) -> Self {
        Self::new(frequencies.iter().copied().map(FrequencyChannel::from_mhz).collect())
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequencyChannel> {
        self.channels.iter()
    }

    pub fn as_slice(&self) -> &[FrequencyChannel] {
        &self.channels
    }

    /// Same channels in the same order.
    pub fn matches(&self, other: &[FrequencyChannel]) -> bool {
        self.channels.as_ref() == other
    }
}
