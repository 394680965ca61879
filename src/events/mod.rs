pub mod record;
pub mod recorder;
pub mod sink;

pub use record::EventRecord;
pub use recorder::{EventRecorder, EventSender};
pub use sink::{EventSink, JsonLinesEventLog};
