use crate::core::sentence::parametric_address;
use crate::core::{SentenceKind, TimeSource};
use crate::decode::time_field::{parse_rmc_date, parse_time_field, parse_zda_date, NmeaTimeInfo};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// A timestamp extracted from a sentence, with the source that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceTimestamp {
    pub source: TimeSource,
    pub timestamp: DateTime<Utc>,
}

/// Extracts UTC timestamps from time-bearing NMEA 0183 sentences
///
/// GLL, GGA and GBS sentences only carry a time of day. They borrow the date
/// of the most recent valid RMC or ZDA sentence seen by this extractor, so one
/// extractor must be used per scan or playback session and [`reset`] between
/// unrelated files.
///
/// [`reset`]: TimestampExtractor::reset
#[derive(Debug, Clone, Default)]
pub struct TimestampExtractor {
    /// Most recent date validated from an RMC or ZDA sentence
    cached_date: Option<NaiveDate>,
    /// When set, only sentences from this source yield timestamps
    primary: Option<TimeSource>,
}

impl TimestampExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the timestamp of a `$` sentence of any time-bearing kind
    pub fn extract(&mut self, sentence: &str) -> Option<SentenceTimestamp> {
        let (talker, code) = parametric_address(sentence)?;
        let kind = SentenceKind::from_code(code)?;
        let (timestamp, precision) = self.extract_kind(sentence, kind)?;

        Some(SentenceTimestamp {
            source: TimeSource::new(talker, kind, precision),
            timestamp,
        })
    }

    /// Like [`extract`](Self::extract), but rejects sentences that do not come
    /// from the locked primary source.
    ///
    /// Rejected RMC and ZDA sentences still refresh the cached date.
    pub fn extract_primary(&mut self, sentence: &str) -> Option<SentenceTimestamp> {
        let found = self.extract(sentence)?;
        match &self.primary {
            Some(primary) if *primary != found.source => None,
            _ => Some(found),
        }
    }

    /// Extract the timestamp and precision of a sentence of a known kind
    pub fn extract_kind(
        &mut self,
        sentence: &str,
        kind: SentenceKind,
    ) -> Option<(DateTime<Utc>, u8)> {
        let fields: Vec<&str> = sentence.split(|c| c == ',' || c == '*').collect();
        let field = |idx: usize| fields.get(idx).copied();

        let (time_field, date) = match kind {
            SentenceKind::Rmc => {
                // $GPRMC,hhmmss.ss,A,llll.ll,a,yyyyy.yy,a,x.x,x.x,ddmmyy,x.x,a*hh
                let time_field = parse_time_field(field(1)?)?;
                let date = parse_rmc_date(field(9)?)?;
                self.cached_date = Some(date);
                (time_field, Some(date))
            }
            SentenceKind::Zda => {
                // $GPZDA,hhmmss.ss,dd,mm,yyyy,zh,zm*hh
                let time_field = parse_time_field(field(1)?)?;
                let date = parse_zda_date(field(2)?, field(3)?, field(4)?)?;
                self.cached_date = Some(date);
                (time_field, Some(date))
            }
            SentenceKind::Gll => {
                // $GPGLL,llll.ll,a,yyyyy.yy,a,hhmmss.ss,A*hh
                (parse_time_field(field(5)?)?, self.cached_date)
            }
            SentenceKind::Gga | SentenceKind::Gbs => {
                (parse_time_field(field(1)?)?, self.cached_date)
            }
        };

        let info = NmeaTimeInfo {
            date,
            time: Some(time_field.time),
        };
        Some((info.to_utc()?, time_field.precision))
    }

    /// Only accept timestamps from `source` from now on
    pub fn lock_to(&mut self, source: TimeSource) {
        self.primary = Some(source);
    }

    /// Accept timestamps from every time-bearing sentence
    pub fn unlock(&mut self) {
        self.primary = None;
    }

    pub fn primary(&self) -> Option<&TimeSource> {
        self.primary.as_ref()
    }

    pub fn cached_date(&self) -> Option<NaiveDate> {
        self.cached_date
    }

    /// Forget the cached date but keep the primary source lock
    pub fn forget_date(&mut self) {
        self.cached_date = None;
    }

    /// Clear the cached date and the primary source lock
    pub fn reset(&mut self) {
        self.cached_date = None;
        self.primary = None;
    }
}

/// Parse an ISO 8601 timestamp such as `2024-03-01T12:00:00.250Z`.
///
/// The fractional seconds are optional. A value without a zone designator is
/// read as UTC.
pub fn parse_iso8601(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim().trim_matches('"');

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
