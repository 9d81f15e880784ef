use crate::input::InputFormat;
use crate::playback::{PlaybackEngine, PlaybackState};
use chrono::{DateTime, Duration, Utc};
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

/// Where a seek lands
struct SeekTarget {
    line: usize,
    timestamp: Option<DateTime<Utc>>,
}

impl PlaybackEngine {
    /// Reposition playback at `fraction` of the recording.
    ///
    /// Seeks by time when the file has a clock, landing on the first record at
    /// or after the target instant, and by line otherwise. Returns false and
    /// leaves everything untouched when the fraction is outside `[0, 1]`, no
    /// record can be found, or playback has already reached the end.
    pub fn seek_to_fraction(&mut self, fraction: f64) -> bool {
        if !(0.0..=1.0).contains(&fraction) {
            warn!("Invalid seek fraction: {}", fraction);
            return false;
        }
        if self.log.is_none() {
            warn!("Cannot seek, no file open");
            return false;
        }
        if !matches!(
            self.state,
            PlaybackState::Idle | PlaybackState::Playing | PlaybackState::Paused
        ) {
            warn!("Cannot seek in state {:?}; load the file again", self.state);
            return false;
        }

        let target = if self.has_valid_timestamps() {
            self.find_time_target(fraction)
        } else {
            self.find_line_target(fraction)
        };
        let Some(target) = target else {
            warn!("No record found at seek position {:.3}", fraction);
            return false;
        };

        self.disarm();
        self.buffer.clear();
        if let Some(log) = self.log.as_mut() {
            log.go_to_line(target.line);
        }
        if target.timestamp.is_some() {
            self.file_clock.current_timestamp = target.timestamp;
        }
        debug!(
            "Seeked to line {} ({:?})",
            target.line + 1,
            self.file_clock.current_timestamp
        );

        if self.state == PlaybackState::Playing {
            self.adjust_playback_base_time();
            self.arm(StdDuration::ZERO);
        }
        self.notify_ui();
        true
    }

    fn find_line_target(&self, fraction: f64) -> Option<SeekTarget> {
        let log = self.log.as_ref()?;
        if log.line_count() == 0 {
            return None;
        }
        let line = (fraction * log.line_count() as f64).round() as usize;
        Some(SeekTarget {
            line: line.max(self.file_clock.data_start),
            timestamp: None,
        })
    }

    /// Scan from the first record for the first timestamp at or after the
    /// target. On success the extractor carries the date context of the
    /// found record.
    fn find_time_target(&mut self, fraction: f64) -> Option<SeekTarget> {
        let first = self.file_clock.first_timestamp?;
        let span = self.file_clock.span()?;
        let target = first + fraction_of(span, fraction);

        let format = self.file_clock.format;
        let data_start = self.file_clock.data_start;
        let log = self.log.as_mut()?;
        let saved = log.position();

        let mut extractor = self.extractor.clone();
        extractor.forget_date();
        log.go_to_line(data_start);

        let mut found = None;
        while let Some(line) = log.next_record() {
            let timestamp = match format {
                Some(InputFormat::Csv(layout)) => {
                    layout.parse_row(&line.text).and_then(|row| row.timestamp)
                }
                _ => extractor
                    .extract_primary(&line.text)
                    .map(|found| found.timestamp),
            };
            if let Some(timestamp) = timestamp.filter(|timestamp| *timestamp >= target) {
                found = Some(SeekTarget {
                    line: line.index,
                    timestamp: Some(timestamp),
                });
                break;
            }
        }
        log.go_to_line(saved);

        if found.is_some() {
            self.extractor = extractor;
        }
        found
    }
}

fn fraction_of(span: Duration, fraction: f64) -> Duration {
    let millis = span.num_milliseconds() as f64 * fraction;
    Duration::milliseconds(millis.round() as i64)
}

#[cfg(test)]
mod tests {
    use crate::input::TextLog;
    use crate::playback::{PlaybackConfig, PlaybackEngine, PlaybackState};
    use crate::testdata;
    use crate::timing::{MockClock, MockTimer};
    use chrono::{DateTime, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn engine(
        text: &str,
        timer: &MockTimer,
    ) -> (PlaybackEngine, Rc<RefCell<Vec<String>>>) {
        let out = Rc::new(RefCell::new(Vec::new()));
        let sink_out = out.clone();
        let mut engine = PlaybackEngine::new(
            PlaybackConfig::default(),
            Box::new(MockClock::new()),
            Box::new(timer.clone()),
            Box::new(move |record: &str| sink_out.borrow_mut().push(record.to_string())),
        );
        engine.load_log(TextLog::from_text("seek", text));
        engine.scan_file_timestamps().unwrap();
        (engine, out)
    }

    fn seconds(count: i64) -> String {
        let offsets: Vec<i64> = (0..count).map(|s| s * 1000).collect();
        testdata::csv_recording(&offsets)
    }

    #[test]
    fn test_out_of_range_fraction_is_rejected() {
        let timer = MockTimer::new();
        let (mut engine, _) = engine(&seconds(11), &timer);
        assert!(engine.seek_to_fraction(0.5));
        let before = engine.current_timestamp();

        assert!(!engine.seek_to_fraction(1.5));
        assert!(!engine.seek_to_fraction(-0.1));
        assert!(!engine.seek_to_fraction(f64::NAN));
        assert_eq!(engine.current_timestamp(), before);
        assert!((engine.progress_fraction() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_seek_by_time_in_csv() {
        let timer = MockTimer::new();
        let (mut engine, _) = engine(&seconds(11), &timer);

        assert!(engine.seek_to_fraction(0.5));
        assert_eq!(engine.current_timestamp(), Some(utc("2024-03-01T12:00:05Z")));
        assert!((engine.progress_fraction() - 0.5).abs() < 1e-9);

        assert!(engine.seek_to_fraction(1.0));
        assert_eq!(engine.progress_fraction(), 1.0);

        assert!(engine.seek_to_fraction(0.0));
        assert_eq!(engine.progress_fraction(), 0.0);
    }

    #[test]
    fn test_seek_lands_on_next_record() {
        let timer = MockTimer::new();
        let (mut engine, _) = engine(&testdata::csv_recording(&[0, 1000, 9000, 10_000]), &timer);

        // 5 s falls in the gap; the 9 s row is the first at or after it
        assert!(engine.seek_to_fraction(0.5));
        assert_eq!(engine.current_timestamp(), Some(utc("2024-03-01T12:00:09Z")));
    }

    #[test]
    fn test_playback_resumes_from_seek_target() {
        let timer = MockTimer::new();
        let (mut engine, out) = engine(&seconds(11), &timer);

        assert!(engine.seek_to_fraction(0.5));
        engine.start();
        assert_eq!(out.borrow()[0], "$IIMWV,5.0,R,0.1,K,A*28");
        assert_eq!(timer.pending_delay(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_seek_while_playing_rearms_immediately() {
        let timer = MockTimer::new();
        let (mut engine, out) = engine(&seconds(11), &timer);
        engine.start();
        let pending = timer.pending().unwrap();

        assert!(engine.seek_to_fraction(0.8));
        assert!(timer.cancelled().contains(&pending));
        assert_eq!(timer.pending_delay(), Some(Duration::ZERO));
        assert_eq!(engine.state(), PlaybackState::Playing);

        out.borrow_mut().clear();
        let token = timer.fire().unwrap();
        engine.on_timer(token);
        assert_eq!(out.borrow()[0], "$IIMWV,8.0,R,0.1,K,A*28");
    }

    #[test]
    fn test_seek_by_time_in_raw_sentences() {
        let timer = MockTimer::new();
        let (mut engine, _) = engine(&testdata::one_hertz_rmc(11), &timer);

        assert!(engine.seek_to_fraction(0.5));
        assert_eq!(engine.current_timestamp(), Some(utc("2024-01-01T12:00:05Z")));
        assert!((engine.progress_fraction() - 0.5).abs() < 1e-9);

        assert!(engine.seek_to_fraction(0.0));
        assert_eq!(engine.current_timestamp(), Some(utc("2024-01-01T12:00:00Z")));
    }

    #[test]
    fn test_seek_by_line_without_timestamps() {
        let timer = MockTimer::new();
        let (mut engine, _) = engine(&testdata::no_timestamps(20), &timer);

        assert!(engine.seek_to_fraction(0.5));
        assert!((engine.progress_fraction() - 0.5).abs() < 1e-9);
        assert!(engine.seek_to_fraction(1.0));
        assert_eq!(engine.progress_fraction(), 1.0);
        assert!(engine.seek_to_fraction(0.0));
        assert_eq!(engine.progress_fraction(), 0.0);
    }

    #[test]
    fn test_seek_without_file() {
        let mut engine = PlaybackEngine::new(
            PlaybackConfig::default(),
            Box::new(MockClock::new()),
            Box::new(MockTimer::new()),
            Box::new(|_: &str| {}),
        );
        assert!(!engine.seek_to_fraction(0.5));
    }

    #[test]
    fn test_seek_after_end_is_rejected() {
        let timer = MockTimer::new();
        let (mut engine, out) = engine(&testdata::no_timestamps(5), &timer);
        engine.start();
        assert_eq!(engine.state(), PlaybackState::AtEnd);
        assert_eq!(engine.progress_fraction(), 1.0);

        assert!(!engine.seek_to_fraction(0.0));
        assert_eq!(engine.state(), PlaybackState::AtEnd);
        assert_eq!(engine.progress_fraction(), 1.0);
        assert_eq!(out.borrow().len(), 5);
    }
}
