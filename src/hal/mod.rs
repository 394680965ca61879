pub mod mock;
#[cfg(feature = "rtlsdr")]
pub mod rtl;
pub mod sampler;
pub mod traits;

pub use sampler::{Lease, SpectrumSampler};
pub use traits::Receiver;
