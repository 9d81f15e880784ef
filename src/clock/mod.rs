pub mod inventory;
pub mod scanner;

pub use inventory::TimeSourceInventory;
pub use scanner::{scan_log, ScanReport};

use crate::core::TimeSource;
use crate::input::InputFormat;
use chrono::{DateTime, Duration, Utc};

/// Clock metadata of a loaded recording
///
/// Rebuilt from scratch by every scan. All timestamps stay None until the
/// scan establishes them.
#[derive(Debug, Clone, Default)]
pub struct FileClock {
    /// None until the format is detected
    pub format: Option<InputFormat>,
    /// Index of the first data line (after the CSV header)
    pub data_start: usize,
    pub has_timestamps: bool,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub current_timestamp: Option<DateTime<Utc>>,
    /// Raw sentence files only
    pub primary_source: Option<TimeSource>,
    pub inventory: TimeSourceInventory,
}

impl FileClock {
    pub fn is_csv(&self) -> bool {
        self.format.map_or(false, |format| format.is_csv())
    }

    pub fn has_primary_source(&self) -> bool {
        self.primary_source.is_some()
    }

    /// Whether playback can be paced by timestamps
    pub fn has_valid_timestamps(&self) -> bool {
        self.has_timestamps
            && self.first_timestamp.is_some()
            && self.last_timestamp.is_some()
            && self.current_timestamp.is_some()
    }

    /// Recording time between the first and last timestamp
    pub fn span(&self) -> Option<Duration> {
        Some(self.last_timestamp? - self.first_timestamp?)
    }

    /// Recording time between the first and current timestamp
    pub fn elapsed(&self) -> Option<Duration> {
        Some(self.current_timestamp? - self.first_timestamp?)
    }
}
