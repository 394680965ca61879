pub mod baseline;
pub mod monitor;
pub mod scorer;
pub mod trigger;

pub use baseline::{Baseline, BaselineTracker, BaselineUpdate};
pub use monitor::{LiveMonitor, MonitorEvent, MonitorReading};
pub use scorer::{JammingScorer, ScoreBreakdown};
pub use trigger::CompositeTrigger;
