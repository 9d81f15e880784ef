pub mod time_field;
pub mod timestamp;

pub use time_field::{NmeaTimeInfo, TimeField};
pub use timestamp::{parse_iso8601, SentenceTimestamp, TimestampExtractor};
