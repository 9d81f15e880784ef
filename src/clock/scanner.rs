use crate::clock::FileClock;
use crate::core::SentenceHeader;
use crate::decode::TimestampExtractor;
use crate::error::{ReplayError, Result};
use crate::input::{detect_format, CsvLayout, InputFormat, TextLog};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of a successful scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub is_csv: bool,
    /// A playback clock was established
    pub has_valid_timestamps: bool,
    /// Structurally valid sentences, or CSV rows with a message cell
    pub valid_records: usize,
    pub invalid_records: usize,
    /// Records that yielded a timestamp
    pub timestamped_records: usize,
}

/// Scan a whole recording and build its clock metadata.
///
/// CSV recordings must be strictly chronological; the first row that goes
/// backwards aborts the scan. Raw sentence recordings are classified line by
/// line, their time sources inventoried and a primary source selected. When
/// `lock_primary` is set the extractor only accepts that source afterwards.
///
/// On success the cursor is left at the first data line. On failure it is
/// rewound to the start of the file.
pub fn scan_log(
    log: &mut TextLog,
    extractor: &mut TimestampExtractor,
    lock_primary: bool,
) -> Result<(FileClock, ScanReport)> {
    info!("Scanning timestamps in {}", log.name());
    extractor.reset();

    let mut clock = FileClock::default();
    let mut report = ScanReport::default();

    let Some((format, data_start)) = detect_format(log) else {
        info!("File is empty or contains only empty lines");
        log.rewind();
        return Ok((clock, report));
    };
    clock.format = Some(format);
    clock.data_start = data_start;

    let scanned = match format {
        InputFormat::Csv(layout) => scan_csv(log, layout, &mut clock, &mut report),
        InputFormat::Raw => scan_raw(log, extractor, lock_primary, &mut clock, &mut report),
    };
    if let Err(err) = scanned {
        log.rewind();
        return Err(err);
    }

    report.is_csv = format.is_csv();
    report.has_valid_timestamps = clock.has_valid_timestamps();
    log.go_to_line(data_start);
    Ok((clock, report))
}

fn scan_csv(
    log: &mut TextLog,
    layout: CsvLayout,
    clock: &mut FileClock,
    report: &mut ScanReport,
) -> Result<()> {
    let mut previous: Option<DateTime<Utc>> = None;

    while let Some(line) = log.next_record() {
        let Some(row) = layout.parse_row(&line.text) else {
            report.invalid_records += 1;
            continue;
        };
        report.valid_records += 1;

        let Some(timestamp) = row.timestamp else {
            continue;
        };
        if let Some(previous) = previous.filter(|previous| timestamp < *previous) {
            warn!(
                "CSV file contains non-chronological timestamps. Previous: {}, Current: {}",
                previous.to_rfc3339(),
                timestamp.to_rfc3339()
            );
            return Err(ReplayError::NonChronological {
                previous,
                current: timestamp,
            });
        }

        previous = Some(timestamp);
        clock.last_timestamp = Some(timestamp);
        if clock.first_timestamp.is_none() {
            clock.first_timestamp = Some(timestamp);
            clock.current_timestamp = Some(timestamp);
        }
        clock.has_timestamps = true;
        report.timestamped_records += 1;
    }

    info!(
        "Found {} CSV rows ({} timestamped, {} malformed) in {}",
        report.valid_records,
        report.timestamped_records,
        report.invalid_records,
        log.name()
    );
    Ok(())
}

fn scan_raw(
    log: &mut TextLog,
    extractor: &mut TimestampExtractor,
    lock_primary: bool,
    clock: &mut FileClock,
    report: &mut ScanReport,
) -> Result<()> {
    while let Some(line) = log.next_record() {
        let Some(header) = SentenceHeader::validate(&line.text) else {
            report.invalid_records += 1;
            continue;
        };
        report.valid_records += 1;

        if header.time_kind().is_none() {
            continue;
        }
        if let Some(found) = extractor.extract(&line.text) {
            clock.inventory.observe(found.source, found.timestamp);
            report.timestamped_records += 1;
        }
    }

    info!(
        "Found {} valid and {} invalid sentences in {}",
        report.valid_records,
        report.invalid_records,
        log.name()
    );

    if report.valid_records == 0 {
        return Err(ReplayError::InvalidFile);
    }

    if clock.inventory.is_empty() {
        info!("No timestamps found in NMEA file {}", log.name());
        return Ok(());
    }

    for (source, details) in clock.inventory.iter() {
        info!(
            "  {}{}: precision={}. is_chronological={}. Start={}. End={}",
            source.talker,
            source.kind,
            source.precision,
            details.is_chronological,
            details.start_time.to_rfc3339(),
            details.end_time.to_rfc3339()
        );
    }

    let Some(primary) = clock.inventory.select_primary().cloned() else {
        info!("No chronological time source in {}", log.name());
        return Ok(());
    };
    let Some(details) = clock.inventory.get(&primary).cloned() else {
        return Ok(());
    };

    clock.first_timestamp = Some(details.start_time);
    clock.current_timestamp = Some(details.start_time);
    clock.last_timestamp = Some(details.end_time);
    clock.has_timestamps = true;

    info!(
        "Using {} as primary time source. Start={}. End={}",
        primary,
        details.start_time.to_rfc3339(),
        details.end_time.to_rfc3339()
    );

    if lock_primary {
        extractor.lock_to(primary.clone());
    } else {
        extractor.unlock();
    }
    clock.primary_source = Some(primary);
    Ok(())
}
