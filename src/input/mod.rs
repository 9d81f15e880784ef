pub mod csv;
pub mod log_file;

pub use self::csv::{CsvLayout, CsvRow};
pub use log_file::{LogLine, TextLog};

/// Input format detection result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// One NMEA 0183 / AIS sentence per line
    Raw,
    /// Header row plus rows carrying an ISO 8601 timestamp and a message
    Csv(CsvLayout),
}

impl InputFormat {
    pub fn is_csv(&self) -> bool {
        matches!(self, InputFormat::Csv(_))
    }
}

/// Detect the format of a recording from its first non-empty, non-comment line.
///
/// Returns the format and the index of the first data line, and leaves the
/// cursor there. Returns None for a file without any such line.
pub fn detect_format(log: &mut TextLog) -> Option<(InputFormat, usize)> {
    log.rewind();
    let first = log.next_record()?;

    match CsvLayout::from_header(&first.text) {
        Some(layout) => Some((InputFormat::Csv(layout), first.index + 1)),
        None => {
            log.go_to_line(first.index);
            Some((InputFormat::Raw, first.index))
        }
    }
}
