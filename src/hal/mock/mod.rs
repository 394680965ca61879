pub mod receiver;

pub use receiver::{SimulatedControls, SimulatedReceiver, ToneProfile};
