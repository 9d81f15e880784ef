use crate::core::SentenceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a stream of time-bearing sentences within a recording
///
/// Two sightings belong to the same source only when talker, sentence kind
/// and fractional-second precision all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSource {
    /// GP, GN, II, ...
    pub talker: String,
    pub kind: SentenceKind,
    /// Digits after the decimal point in the time field, 0 when absent
    pub precision: u8,
}

impl TimeSource {
    pub fn new(talker: &str, kind: SentenceKind, precision: u8) -> Self {
        Self {
            talker: talker.to_string(),
            kind,
            precision,
        }
    }
}

impl fmt::Display for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} (precision={})", self.talker, self.kind, self.precision)
    }
}

/// Accumulated sightings of one time source during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSourceDetails {
    pub start_time: DateTime<Utc>,
    pub current_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Cleared for good the first time a sighting goes backwards
    pub is_chronological: bool,
}

impl TimeSourceDetails {
    /// Details for the first sighting of a source
    pub fn first_seen(timestamp: DateTime<Utc>) -> Self {
        Self {
            start_time: timestamp,
            current_time: timestamp,
            end_time: timestamp,
            is_chronological: true,
        }
    }

    /// Record a later sighting of the same source
    pub fn observe(&mut self, timestamp: DateTime<Utc>) {
        if timestamp < self.current_time {
            self.is_chronological = false;
        }
        self.current_time = timestamp;
        self.end_time = timestamp;
    }
}
