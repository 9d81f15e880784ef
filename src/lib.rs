//! Replay of voyage data recordings.
//!
//! Recordings are raw NMEA 0183 sentence logs or CSV exports with an ISO 8601
//! timestamp column. A scan infers the recording clock, then
//! [`PlaybackEngine`] re-emits the records at their original cadence,
//! optionally sped up.

pub mod clock;
pub mod config;
pub mod core;
pub mod decode;
pub mod error;
pub mod input;
pub mod output;
pub mod playback;
pub mod timing;

#[cfg(test)]
mod testdata;

pub use clock::{FileClock, ScanReport, TimeSourceInventory};
pub use config::Settings;
pub use error::{ReplayError, Result};
pub use output::{SentenceSink, WriterSink};
pub use playback::{PlaybackConfig, PlaybackEngine, PlaybackState, PlaybackStatus};
pub use timing::{Clock, SystemClock, Timer, TimerToken, TokioTimer};
