//! Answer extraction, job polling, and the relay's fallback chain.

mod extract;
pub mod mock;
mod poll;
mod relay;

pub use extract::{extract, extract_or_dump, SegmentMode, ANSWER_KEYS};
pub use poll::{poll, PollOutcome};
pub use relay::{Relay, StatusReport};
