pub mod runner;
pub mod scheduler;
pub mod state;

pub use runner::{ScanOutputs, ScanRunner};
pub use scheduler::{ChannelScore, ScanScheduler, Sweep, SweepReport};
pub use state::ScanState;
