pub mod analysis;
pub mod capture;
pub mod config;
pub mod core;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod events;
pub mod hal;
pub mod logging;
pub mod observability;
pub mod visualization;

pub use config::ScannerConfig;
pub use error::ScanError;
