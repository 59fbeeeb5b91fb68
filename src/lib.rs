pub mod calendar;
pub mod digest;
pub mod output;
pub mod storage;
pub mod sync;

pub use calendar::{DateRange, Event, EventTime};
pub use digest::{DigestEngine, DigestError, RunOutcome};
