pub mod time_series;

pub use time_series::{TimeSeriesBuffer, WaterfallFrame, DEFAULT_HISTORY};
