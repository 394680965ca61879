pub mod request;
pub mod store;
pub mod worker;

pub use request::{CaptureReason, CaptureRequest};
pub use store::{CaptureStore, FileCaptureStore};
pub use worker::CaptureWorker;
