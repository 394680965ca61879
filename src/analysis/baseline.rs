use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::core::FrequencyChannel;

pub const DEFAULT_ALPHA: f64 = 0.1;

/// Noise-floor state for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub average_power_db: Option<f64>,
    pub sample_count: u64,
}

/// Result of folding one observation into a baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineUpdate {
    /// Average before this observation; `None` on the first one.
    pub previous: Option<f64>,
    pub current: f64,
    pub sample_count: u64,
}

/// Per-channel EWMA of power.
///
/// Each channel has its own lock, so updates to different channels never
/// contend and read-modify-write on the same channel is serialized. The outer
/// map lock is only taken for writing when a channel is seen for the first time.
pub struct BaselineTracker {
    alpha: f64,
    channels: RwLock<HashMap<FrequencyChannel, Arc<Mutex<Baseline>>>>,
}

impl BaselineTracker {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn slot(&self, channel: FrequencyChannel) -> Arc<Mutex<Baseline>> {
        {
            let channels = self.channels.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(slot) = channels.get(&channel) {
                return slot.clone();
            }
        }

        let mut channels = self.channels.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        channels.entry(channel).or_default().clone()
    }

    /// Fold `power_db` into the channel's average and report old and new values.
    pub fn observe(&self, channel: FrequencyChannel, power_db: f64) -> BaselineUpdate {
        let slot = self.slot(channel);
        let mut baseline = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let previous = baseline.average_power_db;
        let current = match previous {
            None => power_db,
            Some(average) => (1.0 - self.alpha) * average + self.alpha * power_db,
        };

        baseline.average_power_db = Some(current);
        baseline.sample_count += 1;

        BaselineUpdate {
            previous,
            current,
            sample_count: baseline.sample_count,
        }
    }

    /// Fold `power_db` in and return the updated average.
    pub fn update(&self, channel: FrequencyChannel, power_db: f64) -> f64 {
        self.observe(channel, power_db).current
    }

    pub fn get(&self, channel: FrequencyChannel) -> Option<f64> {
        self.baseline(channel).and_then(|b| b.average_power_db)
    }

    pub fn baseline(&self, channel: FrequencyChannel) -> Option<Baseline> {
        let channels = self.channels.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .get(&channel)
            .map(|slot| *slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Forget one channel's history.
    pub fn reset(&self, channel: FrequencyChannel) {
        let mut channels = self.channels.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        channels.remove(&channel);
    }

    pub fn reset_all(&self) {
        let mut channels = self.channels.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        channels.clear();
    }

    pub fn snapshot(&self) -> HashMap<FrequencyChannel, Baseline> {
        let channels = self.channels.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .iter()
            .map(|(channel, slot)| {
                (*channel, *slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
            })
            .collect()
    }
}

impl Default for BaselineTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}
