pub mod engine;
pub mod input;

pub use engine::{DigestEngine, DigestError, RunOutcome};
