pub mod channel;
pub mod measurement;

pub use channel::{ChannelList, FrequencyChannel};
pub use measurement::{PowerReading, SampleBlock, SpectralMeasurement, SweepRow};
