pub mod date_range;
pub mod event;

pub use date_range::{DateRange, RangeError};
pub use event::{Event, EventTime};
