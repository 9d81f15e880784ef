pub mod engine;
mod seek;

pub use engine::PlaybackEngine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slowest accepted speed multiplier
pub const MIN_SPEED: f64 = 0.1;
/// Fastest accepted speed multiplier
pub const MAX_SPEED: f64 = 1000.0;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    /// The whole file was replayed
    AtEnd,
    /// Loading or scanning failed
    Error,
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub speed: f64, // 1.0 = real-time, 2.0 = 2x speed
    /// Pace raw sentence files by the primary time source only
    pub lock_primary_source: bool,
    /// Most records held back while catching up before the oldest are dropped
    pub max_buffer_size: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            lock_primary_source: true,
            max_buffer_size: 1000,
        }
    }
}

/// Snapshot passed to the update callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    /// 0.0 to 1.0
    pub progress: f64,
    pub current_timestamp: Option<DateTime<Utc>>,
}
