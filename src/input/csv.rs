use crate::decode::parse_iso8601;
use chrono::{DateTime, Utc};

/// Column positions of a CSV recording
///
/// A recording header must name a timestamp column and a message column, e.g.
/// - timestamp,type,id,message
/// - message,received_timestamp
///
/// Column names are matched case-insensitively by substring; other columns are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvLayout {
    pub timestamp_idx: usize,
    pub message_idx: usize,
}

/// One data row of a CSV recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// None when the timestamp cell is missing or not ISO 8601
    pub timestamp: Option<DateTime<Utc>>,
    pub message: String,
}

impl CsvLayout {
    /// Detect the layout from a header line.
    ///
    /// Lines starting with a sentence marker are never headers.
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim();
        if header.starts_with('$') || header.starts_with('!') {
            return None;
        }

        let fields = split_fields(header)?;
        let (timestamp_idx, message_idx) = detect_columns(&fields)?;
        Some(Self {
            timestamp_idx,
            message_idx,
        })
    }

    /// Parse a data row; None when the row has no message cell
    pub fn parse_row(&self, line: &str) -> Option<CsvRow> {
        let fields = split_fields(line)?;
        let message = fields.get(self.message_idx)?.to_string();
        let timestamp = fields
            .get(self.timestamp_idx)
            .and_then(|cell| parse_iso8601(cell));

        Some(CsvRow { timestamp, message })
    }
}

/// Split one CSV line, honouring double quotes and `""` escapes
fn split_fields(line: &str) -> Option<csv::StringRecord> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    match rdr.read_record(&mut record) {
        Ok(true) => Some(record),
        _ => None,
    }
}

/// Find the timestamp and message columns in a header record
fn detect_columns(headers: &csv::StringRecord) -> Option<(usize, usize)> {
    let mut timestamp_idx = None;
    let mut message_idx = None;

    for (idx, header) in headers.iter().enumerate() {
        let header_lower = header.trim().to_lowercase();
        if header_lower.contains("timestamp") {
            timestamp_idx = Some(idx);
        } else if header_lower.contains("message") {
            message_idx = Some(idx);
        }
    }

    Some((timestamp_idx?, message_idx?))
}
