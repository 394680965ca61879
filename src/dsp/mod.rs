pub mod power;
pub mod spectrum;

pub use power::{mean_power_db, PowerEstimate, PowerEstimator};
pub use spectrum::{bin_frequencies, power_spectrum_db, power_to_db, shifted_fft};
