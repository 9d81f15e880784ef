use crate::core::{TimeSource, TimeSourceDetails};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Score bonus for sentence kinds that carry their own date
const DATED_KIND_BONUS: u32 = 10;
/// Score per fractional-second digit
const PRECISION_WEIGHT: u32 = 2;

/// Time sources seen during a scan, in encounter order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSourceInventory {
    sources: Vec<(TimeSource, TimeSourceDetails)>,
    lookup: HashMap<TimeSource, usize>,
}

impl TimeSourceInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one timestamped sighting of `source`
    pub fn observe(&mut self, source: TimeSource, timestamp: DateTime<Utc>) {
        match self.lookup.get(&source) {
            Some(&idx) => self.sources[idx].1.observe(timestamp),
            None => {
                self.lookup.insert(source.clone(), self.sources.len());
                self.sources
                    .push((source, TimeSourceDetails::first_seen(timestamp)));
            }
        }
    }

    pub fn get(&self, source: &TimeSource) -> Option<&TimeSourceDetails> {
        self.lookup.get(source).map(|&idx| &self.sources[idx].1)
    }

    /// Sources in the order they were first seen
    pub fn iter(&self) -> impl Iterator<Item = (&TimeSource, &TimeSourceDetails)> {
        self.sources.iter().map(|(source, details)| (source, details))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Pick the most trustworthy chronological source as the playback clock.
    ///
    /// Date-bearing kinds (RMC, ZDA) and higher precision score higher. On a
    /// tie the source seen first wins. Returns None when no source is
    /// chronological.
    pub fn select_primary(&self) -> Option<&TimeSource> {
        let mut best: Option<(&TimeSource, u32)> = None;

        for (source, details) in &self.sources {
            if !details.is_chronological {
                continue;
            }
            let score = score(source);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((source, score));
            }
        }

        best.map(|(source, _)| source)
    }
}

fn score(source: &TimeSource) -> u32 {
    let bonus = if source.kind.carries_date() {
        DATED_KIND_BONUS
    } else {
        0
    };
    bonus + PRECISION_WEIGHT * u32::from(source.precision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SentenceKind;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_sighting_creates_details() {
        let mut inventory = TimeSourceInventory::new();
        let source = TimeSource::new("GP", SentenceKind::Rmc, 0);
        inventory.observe(source.clone(), at(5));

        let details = inventory.get(&source).unwrap();
        assert_eq!(details.start_time, at(5));
        assert_eq!(details.current_time, at(5));
        assert_eq!(details.end_time, at(5));
        assert!(details.is_chronological);
    }

    #[test]
    fn test_chronological_flag_is_sticky() {
        let mut inventory = TimeSourceInventory::new();
        let source = TimeSource::new("II", SentenceKind::Gll, 0);
        inventory.observe(source.clone(), at(10));
        inventory.observe(source.clone(), at(10));
        assert!(inventory.get(&source).unwrap().is_chronological);

        inventory.observe(source.clone(), at(9));
        inventory.observe(source.clone(), at(20));
        inventory.observe(source.clone(), at(30));

        let details = inventory.get(&source).unwrap();
        assert!(!details.is_chronological);
        assert_eq!(details.start_time, at(10));
        assert_eq!(details.end_time, at(30));
    }

    #[test]
    fn test_identity_includes_precision() {
        let mut inventory = TimeSourceInventory::new();
        inventory.observe(TimeSource::new("GP", SentenceKind::Rmc, 0), at(1));
        inventory.observe(TimeSource::new("GP", SentenceKind::Rmc, 2), at(1));
        inventory.observe(TimeSource::new("GN", SentenceKind::Rmc, 0), at(1));
        assert_eq!(inventory.len(), 3);
    }

    #[test]
    fn test_select_prefers_dated_then_precision() {
        let mut inventory = TimeSourceInventory::new();
        inventory.observe(TimeSource::new("GP", SentenceKind::Gga, 3), at(1));
        inventory.observe(TimeSource::new("GP", SentenceKind::Rmc, 0), at(1));
        inventory.observe(TimeSource::new("GP", SentenceKind::Rmc, 2), at(1));

        assert_eq!(
            inventory.select_primary(),
            Some(&TimeSource::new("GP", SentenceKind::Rmc, 2))
        );
    }

    #[test]
    fn test_select_skips_non_chronological() {
        let mut inventory = TimeSourceInventory::new();
        let noisy = TimeSource::new("AI", SentenceKind::Rmc, 2);
        let steady = TimeSource::new("GP", SentenceKind::Gll, 0);
        inventory.observe(noisy.clone(), at(5));
        inventory.observe(noisy.clone(), at(1));
        inventory.observe(steady.clone(), at(1));

        assert_eq!(inventory.select_primary(), Some(&steady));
    }

    #[test]
    fn test_select_tie_goes_to_first_seen() {
        let mut inventory = TimeSourceInventory::new();
        inventory.observe(TimeSource::new("II", SentenceKind::Zda, 0), at(1));
        inventory.observe(TimeSource::new("GP", SentenceKind::Rmc, 0), at(1));

        assert_eq!(
            inventory.select_primary(),
            Some(&TimeSource::new("II", SentenceKind::Zda, 0))
        );
    }

    #[test]
    fn test_select_none_when_nothing_chronological() {
        let mut inventory = TimeSourceInventory::new();
        assert!(inventory.select_primary().is_none());

        let source = TimeSource::new("GP", SentenceKind::Rmc, 0);
        inventory.observe(source.clone(), at(2));
        inventory.observe(source, at(1));
        assert!(inventory.select_primary().is_none());
    }
}
