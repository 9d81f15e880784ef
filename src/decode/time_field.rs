use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

/// Two-digit years at or above this value belong to the 1900s
pub const CENTURY_PIVOT: u32 = 70;

/// Date and time pieces gathered from one sentence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NmeaTimeInfo {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl NmeaTimeInfo {
    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.time.is_some()
    }

    /// The UTC instant, when both date and time resolved
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let naive = self.date?.and_time(self.time?);
        Some(Utc.from_utc_datetime(&naive))
    }
}

/// A parsed `HHMMSS[.fff]` time field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeField {
    pub time: NaiveTime,
    /// Number of fractional-second digits
    pub precision: u8,
}

/// Parse an `HHMMSS` time field with an optional fractional part.
///
/// Fractions longer than three digits are truncated to milliseconds but still
/// count toward the precision.
pub fn parse_time_field(field: &str) -> Option<TimeField> {
    let field = field.trim();
    if field.len() < 6 || !field.is_ascii() {
        return None;
    }

    let (hms, rest) = field.split_at(6);
    if !all_digits(hms) {
        return None;
    }
    let hour: u32 = hms[0..2].parse().ok()?;
    let minute: u32 = hms[2..4].parse().ok()?;
    let second: u32 = hms[4..6].parse().ok()?;

    let (millisecond, precision) = if rest.is_empty() {
        (0, 0)
    } else {
        let fraction = rest.strip_prefix('.')?;
        if !all_digits(fraction) {
            return None;
        }
        let millis: String = fraction
            .chars()
            .chain(std::iter::repeat('0'))
            .take(3)
            .collect();
        let precision = u8::try_from(fraction.len()).unwrap_or(u8::MAX);
        (millis.parse::<u32>().ok()?, precision)
    };

    if hour > 23 || minute > 59 || second > 59 || millisecond >= 1000 {
        return None;
    }

    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millisecond)?;
    Some(TimeField { time, precision })
}

/// Parse the RMC `DDMMYY` date field.
///
/// Two-digit years below [`CENTURY_PIVOT`] map to the 2000s, the rest to the 1900s.
pub fn parse_rmc_date(field: &str) -> Option<NaiveDate> {
    let field = field.trim();
    if field.len() < 6 || !field.is_ascii() || !all_digits(&field[..6]) {
        return None;
    }

    let day: u32 = field[0..2].parse().ok()?;
    let month: u32 = field[2..4].parse().ok()?;
    let two_digit_year: u32 = field[4..6].parse().ok()?;
    let year = if two_digit_year >= CENTURY_PIVOT {
        1900 + two_digit_year
    } else {
        2000 + two_digit_year
    };

    validate_date(year as i32, month, day)
}

/// Build a date from the separate ZDA day, month and 4-digit year fields
pub fn parse_zda_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    validate_date(year, month, day)
}

fn validate_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || year < 1900 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}
