use serde::{Deserialize, Serialize};
use std::fmt;

/// Talker ids accepted on `!` (AIS encapsulation) sentences
const AIS_TALKERS: [&str; 3] = ["AI", "AB", "BS"];

/// Sentence kinds that carry a UTC time field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentenceKind {
    /// Recommended minimum data: time and date
    Rmc,
    /// Time and date
    Zda,
    /// Geographic position: time only
    Gll,
    /// Fix data: time only
    Gga,
    /// Satellite fault detection: time only
    Gbs,
}

impl SentenceKind {
    /// Map a 3-letter sentence code to a time-bearing kind
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "RMC" => Some(SentenceKind::Rmc),
            "ZDA" => Some(SentenceKind::Zda),
            "GLL" => Some(SentenceKind::Gll),
            "GGA" => Some(SentenceKind::Gga),
            "GBS" => Some(SentenceKind::Gbs),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            SentenceKind::Rmc => "RMC",
            SentenceKind::Zda => "ZDA",
            SentenceKind::Gll => "GLL",
            SentenceKind::Gga => "GGA",
            SentenceKind::Gbs => "GBS",
        }
    }

    /// Whether the sentence carries its own date
    pub fn carries_date(self) -> bool {
        matches!(self, SentenceKind::Rmc | SentenceKind::Zda)
    }
}

impl fmt::Display for SentenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Leading marker of a sentence line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceStart {
    /// `$`
    Parametric,
    /// `!`
    Encapsulated,
}

/// Address field of a structurally valid sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceHeader {
    pub start: SentenceStart,
    /// 2-letter talker id (GP, II, AI, ...)
    pub talker: String,
    /// 3-letter sentence code (RMC, VDM, ...)
    pub code: String,
}

impl SentenceHeader {
    /// Validate the structure of a candidate sentence line.
    ///
    /// Accepts `$TTKKK,...*hh` and `!TTKKK,...*hh` lines where the talker and
    /// sentence code are uppercase ASCII letters and a comma precedes the
    /// checksum marker. `!` lines are limited to the AIS talkers.
    /// The checksum itself is not verified.
    pub fn validate(line: &str) -> Option<Self> {
        let start = match line.as_bytes().first()? {
            b'$' => SentenceStart::Parametric,
            b'!' => SentenceStart::Encapsulated,
            _ => return None,
        };

        let address = line.split(|c| c == ',' || c == '*').next()?;
        if address.len() != 6 || !address.is_ascii() {
            return None;
        }

        let talker = &address[1..3];
        let code = &address[3..6];

        if !is_upper_alpha(talker) || !is_upper_alpha(code) {
            return None;
        }
        if start == SentenceStart::Encapsulated && !AIS_TALKERS.contains(&talker) {
            return None;
        }

        let comma = line.find(',')?;
        let star = line.find('*')?;
        if star < comma {
            return None;
        }

        Some(Self {
            start,
            talker: talker.to_string(),
            code: code.to_string(),
        })
    }

    /// The time-bearing kind of this sentence, if any
    pub fn time_kind(&self) -> Option<SentenceKind> {
        SentenceKind::from_code(&self.code)
    }
}

/// Split the address of a `$` sentence into talker and sentence code.
///
/// This is the lenient parse used while extracting timestamps; it does not
/// require a checksum.
pub fn parametric_address(sentence: &str) -> Option<(&str, &str)> {
    let address = sentence.split(|c| c == ',' || c == '*').next()?;
    if !address.starts_with('$') || address.len() != 6 || !address.is_ascii() {
        return None;
    }
    Some((&address[1..3], &address[3..6]))
}

fn is_upper_alpha(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rmc() {
        let header =
            SentenceHeader::validate("$GPRMC,092211.00,A,5759.09700,N,01144.34344,E,5.257,28.27,200715,,,A*58")
                .unwrap();
        assert_eq!(header.talker, "GP");
        assert_eq!(header.code, "RMC");
        assert_eq!(header.start, SentenceStart::Parametric);
        assert_eq!(header.time_kind(), Some(SentenceKind::Rmc));
    }

    #[test]
    fn test_validate_ais() {
        let header = SentenceHeader::validate("!AIVDM,1,1,,A,13aEOK?P00PD2wVMdLDRhgvL289?,0*26").unwrap();
        assert_eq!(header.talker, "AI");
        assert_eq!(header.code, "VDM");
        assert_eq!(header.time_kind(), None);

        // Only AIS talkers on encapsulated sentences
        assert!(SentenceHeader::validate("!GPVDM,1,1,,A,13aEOK,0*26").is_none());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        // No start marker
        assert!(SentenceHeader::validate("GPRMC,092211,A*58").is_none());
        // Address too long
        assert!(SentenceHeader::validate("$GPRMCX,092211,A*58").is_none());
        // Lowercase talker
        assert!(SentenceHeader::validate("$gpRMC,092211,A*58").is_none());
        // Digits in sentence code
        assert!(SentenceHeader::validate("$GPRM1,092211,A*58").is_none());
        // Missing checksum marker
        assert!(SentenceHeader::validate("$GPRMC,092211,A").is_none());
        // Checksum before the first comma
        assert!(SentenceHeader::validate("$GPRMC*58,092211").is_none());
        assert!(SentenceHeader::validate("").is_none());
    }

    #[test]
    fn test_unknown_kind_is_valid_without_time() {
        let header = SentenceHeader::validate("$IIMWV,214.8,R,0.1,K,A*28").unwrap();
        assert_eq!(header.code, "MWV");
        assert_eq!(header.time_kind(), None);
    }

    #[test]
    fn test_parametric_address() {
        assert_eq!(parametric_address("$GPGGA,123519,4807.038"), Some(("GP", "GGA")));
        assert_eq!(parametric_address("!AIVDM,1,1"), None);
        assert_eq!(parametric_address("$GPGGAX,123519"), None);
    }
}
