use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by loading and scanning a recording
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The recording could not be opened or read
    #[error("Failed to open file: {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An operation needed a loaded file
    #[error("File not open")]
    NotLoaded,

    /// A raw sentence file without a single structurally valid sentence
    #[error("Invalid file")]
    InvalidFile,

    /// A CSV row is older than the row before it
    #[error("Timestamps not in chronological order")]
    NonChronological {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

pub type Result<T> = std::result::Result<T, ReplayError>;
