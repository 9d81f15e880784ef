pub mod sentence;
pub mod time_source;

pub use sentence::{SentenceHeader, SentenceKind, SentenceStart};
pub use time_source::{TimeSource, TimeSourceDetails};
