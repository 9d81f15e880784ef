use crate::clock::{scan_log, FileClock, ScanReport, TimeSourceInventory};
use crate::core::TimeSource;
use crate::decode::TimestampExtractor;
use crate::error::{ReplayError, Result};
use crate::input::{detect_format, InputFormat, TextLog};
use crate::output::SentenceSink;
use crate::playback::{PlaybackConfig, PlaybackState, PlaybackStatus, MAX_SPEED, MIN_SPEED};
use crate::timing::{Clock, Timer, TimerToken};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration as StdDuration, Instant};
use tracing::{debug, info, warn};

/// Records flushed per tick when the file has no usable clock
const BATCH_SIZE: usize = 10;
/// Interval between batches at 1x speed
const BATCH_INTERVAL: StdDuration = StdDuration::from_millis(1000);

/// Ties the recording timeline to the wall clock.
///
/// At wall time `wall` playback was at `log_offset` past the first timestamp.
/// This is the playback base time `wall - log_offset / speed` kept in a form
/// that never needs an `Instant` before the anchor.
#[derive(Debug, Clone, Copy)]
struct PlaybackAnchor {
    wall: Instant,
    log_offset: Duration,
}

/// One record read from the file
struct Record {
    payload: String,
    /// Set only when the record can pace playback
    timestamp: Option<DateTime<Utc>>,
}

/// Timer-driven replay of a recording at its original cadence
pub struct PlaybackEngine {
    pub(super) config: PlaybackConfig,
    clock: Box<dyn Clock>,
    timer: Box<dyn Timer>,
    sink: Box<dyn SentenceSink>,
    on_update: Option<Box<dyn FnMut(&PlaybackStatus)>>,

    pub(super) log: Option<TextLog>,
    pub(super) file_clock: FileClock,
    pub(super) extractor: TimestampExtractor,
    pub(super) state: PlaybackState,
    /// Records read but not yet emitted
    pub(super) buffer: VecDeque<String>,
    messages_dropped: bool,
    anchor: Option<PlaybackAnchor>,
    /// The single outstanding wake-up
    pending: Option<TimerToken>,
}

impl PlaybackEngine {
    pub fn new(
        config: PlaybackConfig,
        clock: Box<dyn Clock>,
        timer: Box<dyn Timer>,
        sink: Box<dyn SentenceSink>,
    ) -> Self {
        let mut engine = Self {
            config: PlaybackConfig::default(),
            clock,
            timer,
            sink,
            on_update: None,
            log: None,
            file_clock: FileClock::default(),
            extractor: TimestampExtractor::new(),
            state: PlaybackState::Idle,
            buffer: VecDeque::new(),
            messages_dropped: false,
            anchor: None,
            pending: None,
        };
        engine.config.lock_primary_source = config.lock_primary_source;
        engine.config.max_buffer_size = config.max_buffer_size.max(BATCH_SIZE);
        engine.config.speed = clamp_speed(config.speed).unwrap_or(1.0);
        engine
    }

    /// Register the callback invoked after every state-relevant change
    pub fn set_update_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&PlaybackStatus) + 'static,
    {
        self.on_update = Some(Box::new(callback));
    }

    /// Open a recording from disk. Does not scan it.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        match TextLog::open(path) {
            Ok(log) => {
                self.load_log(log);
                Ok(())
            }
            Err(e) => {
                self.reset();
                self.state = PlaybackState::Error;
                warn!("{}", e);
                self.notify_ui();
                Err(e)
            }
        }
    }

    /// Replace the current recording with an already loaded one
    pub fn load_log(&mut self, log: TextLog) {
        self.reset();
        info!("Loaded {} ({} lines)", log.name(), log.line_count());
        self.log = Some(log);
        self.notify_ui();
    }

    /// Discard the file and every piece of state derived from it
    fn reset(&mut self) {
        self.disarm();
        self.log = None;
        self.file_clock = FileClock::default();
        self.extractor.reset();
        self.state = PlaybackState::Idle;
        self.buffer.clear();
        self.messages_dropped = false;
        self.anchor = None;
    }

    /// Scan the loaded file and establish its playback clock
    pub fn scan_file_timestamps(&mut self) -> Result<ScanReport> {
        self.disarm();
        self.buffer.clear();
        self.anchor = None;
        self.file_clock = FileClock::default();

        let Some(log) = self.log.as_mut() else {
            warn!("File not open");
            return Err(ReplayError::NotLoaded);
        };

        let result = scan_log(log, &mut self.extractor, self.config.lock_primary_source);
        let outcome = match result {
            Ok((file_clock, report)) => {
                self.file_clock = file_clock;
                // The cursor is back at the first record, so no date is known yet
                self.extractor.forget_date();
                self.state = PlaybackState::Idle;
                Ok(report)
            }
            Err(e) => {
                self.extractor.reset();
                self.state = PlaybackState::Error;
                Err(e)
            }
        };
        self.notify_ui();
        outcome
    }

    /// Start playback, or resume it when paused
    pub fn start(&mut self) {
        match self.state {
            PlaybackState::Idle | PlaybackState::Paused => {}
            PlaybackState::Playing => return,
            PlaybackState::AtEnd | PlaybackState::Error => {
                warn!("Cannot start playback in state {:?}; load the file again", self.state);
                return;
            }
        }
        if self.log.is_none() {
            warn!("Cannot start playback, no file open");
            return;
        }

        self.ensure_format();
        self.messages_dropped = false;
        self.state = PlaybackState::Playing;
        self.adjust_playback_base_time();

        info!(
            "Start playback from file: {}. Progress: {:.2}. Has timestamps: {}",
            self.log.as_ref().map_or("", |log| log.name()),
            self.progress_fraction(),
            self.has_valid_timestamps()
        );
        self.notify_ui();
        self.notify();
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.disarm();
        self.state = PlaybackState::Paused;
        self.notify_ui();
    }

    /// Stop playback and return to the first record
    pub fn stop(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            return;
        }
        self.disarm();
        self.buffer.clear();
        self.anchor = None;
        self.rewind();
        self.file_clock.current_timestamp = self.file_clock.first_timestamp;
        self.state = PlaybackState::Idle;
        self.notify_ui();
    }

    /// Timer callback; ignores tokens other than the outstanding one
    pub fn on_timer(&mut self, token: TimerToken) {
        if self.pending != Some(token) {
            debug!("Ignoring stale wake-up {:?}", token);
            return;
        }
        self.pending = None;
        self.notify();
    }

    /// Read records until playback is ahead of the wall clock, then arm the
    /// next wake-up.
    pub fn notify(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.disarm();
        let now = self.clock.now();

        loop {
            let Some(line) = self.log.as_mut().and_then(|log| log.next_record()) else {
                self.finish();
                return;
            };
            let Some(record) = self.read_record(&line.text) else {
                debug!("Skipping malformed row at line {}", line.index + 1);
                continue;
            };
            self.push_buffer(record.payload);

            match record.timestamp {
                Some(timestamp) => {
                    self.file_clock.current_timestamp = Some(timestamp);
                    if let Some(delay) = self.time_until_due(timestamp, now) {
                        self.flush_buffer();
                        debug!("Next record due in {:?}", delay);
                        self.arm(delay);
                        break;
                    }
                }
                None if !self.has_valid_timestamps() && self.buffer.len() >= BATCH_SIZE => {
                    self.flush_buffer();
                    self.arm(BATCH_INTERVAL.div_f64(self.config.speed));
                    break;
                }
                None => {}
            }
        }

        self.notify_ui();
    }

    pub fn set_speed_multiplier(&mut self, speed: f64) {
        let Some(speed) = clamp_speed(speed) else {
            warn!("Ignoring invalid speed multiplier: {}", speed);
            return;
        };
        self.config.speed = speed;

        if self.state == PlaybackState::Playing {
            self.adjust_playback_base_time();
            if self.has_valid_timestamps() {
                // Re-plan the next record against the new mapping
                self.arm(StdDuration::ZERO);
            } else {
                self.arm(BATCH_INTERVAL.div_f64(speed));
            }
        }
        self.notify_ui();
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.config.speed
    }

    /// Map the current recording position to the wall clock at this instant
    pub fn adjust_playback_base_time(&mut self) {
        self.anchor = self.file_clock.elapsed().map(|log_offset| PlaybackAnchor {
            wall: self.clock.now(),
            log_offset,
        });
    }

    /// Playback position in `[0, 1]`, by time when the file has a clock and
    /// by line otherwise
    pub fn progress_fraction(&self) -> f64 {
        if self.has_valid_timestamps() {
            let (Some(span), Some(elapsed)) = (self.file_clock.span(), self.file_clock.elapsed())
            else {
                return 0.0;
            };
            if span <= Duration::zero() {
                return 0.0;
            }
            return (elapsed.num_milliseconds() as f64 / span.num_milliseconds() as f64)
                .clamp(0.0, 1.0);
        }

        match &self.log {
            Some(log) if log.line_count() > 0 => {
                (log.position() as f64 / log.line_count() as f64).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn has_valid_timestamps(&self) -> bool {
        self.file_clock.has_valid_timestamps()
    }

    pub fn is_csv(&self) -> bool {
        self.file_clock.is_csv()
    }

    pub fn current_timestamp(&self) -> Option<DateTime<Utc>> {
        self.file_clock.current_timestamp
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.file_clock.first_timestamp
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.file_clock.last_timestamp
    }

    pub fn primary_source(&self) -> Option<&TimeSource> {
        self.file_clock.primary_source.as_ref()
    }

    pub fn time_sources(&self) -> &TimeSourceInventory {
        &self.file_clock.inventory
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            progress: self.progress_fraction(),
            current_timestamp: self.file_clock.current_timestamp,
        }
    }

    /// Detect the format of a file that was never scanned so a CSV header
    /// is not replayed
    fn ensure_format(&mut self) {
        if self.file_clock.format.is_some() {
            return;
        }
        let Some(log) = self.log.as_mut() else {
            return;
        };
        let position = log.position();
        match detect_format(log) {
            Some((format, data_start)) => {
                self.file_clock.format = Some(format);
                self.file_clock.data_start = data_start;
                log.go_to_line(position.max(data_start));
            }
            None => log.go_to_line(position),
        }
    }

    /// Move the cursor to the first data record
    fn rewind(&mut self) {
        if let Some(log) = self.log.as_mut() {
            log.go_to_line(self.file_clock.data_start);
        }
        self.extractor.forget_date();
    }

    fn read_record(&mut self, text: &str) -> Option<Record> {
        let paced = self.has_valid_timestamps();

        match self.file_clock.format {
            Some(InputFormat::Csv(layout)) => {
                let row = layout.parse_row(text)?;
                Some(Record {
                    payload: row.message,
                    timestamp: row.timestamp.filter(|_| paced),
                })
            }
            _ => {
                let timestamp = if paced {
                    self.extractor.extract_primary(text).map(|found| found.timestamp)
                } else {
                    None
                };
                Some(Record {
                    payload: text.to_string(),
                    timestamp,
                })
            }
        }
    }

    /// Wall-clock delay until `timestamp` is due, None when it is already due
    fn time_until_due(&self, timestamp: DateTime<Utc>, now: Instant) -> Option<StdDuration> {
        let anchor = self.anchor?;
        let first = self.file_clock.first_timestamp?;

        let ahead = (timestamp - first) - anchor.log_offset;
        let wall_ahead = scale(ahead, self.config.speed).to_std().ok()?;
        let delay = (anchor.wall + wall_ahead).checked_duration_since(now)?;
        (!delay.is_zero()).then_some(delay)
    }

    fn push_buffer(&mut self, record: String) {
        self.buffer.push_back(record);
        if self.buffer.len() > self.config.max_buffer_size {
            if !self.messages_dropped {
                warn!(
                    "Playback dropping messages to maintain timing at {:.0}x speed",
                    self.config.speed
                );
                self.messages_dropped = true;
            }
            self.buffer.pop_front();
        }
    }

    fn flush_buffer(&mut self) {
        for record in self.buffer.drain(..) {
            self.sink.emit(&record);
        }
    }

    fn finish(&mut self) {
        self.flush_buffer();
        self.disarm();
        self.state = PlaybackState::AtEnd;
        info!(
            "Reached end of {}",
            self.log.as_ref().map_or("", |log| log.name())
        );
        self.notify_ui();
    }

    pub(super) fn arm(&mut self, delay: StdDuration) {
        self.disarm();
        self.pending = Some(self.timer.schedule_once(delay));
    }

    pub(super) fn disarm(&mut self) {
        if let Some(token) = self.pending.take() {
            self.timer.cancel(token);
        }
    }

    pub(super) fn notify_ui(&mut self) {
        let status = self.status();
        if let Some(callback) = self.on_update.as_mut() {
            callback(&status);
        }
    }
}

fn clamp_speed(speed: f64) -> Option<f64> {
    (speed.is_finite() && speed > 0.0).then(|| speed.clamp(MIN_SPEED, MAX_SPEED))
}

/// Recording time divided by the speed multiplier
fn scale(elapsed: Duration, speed: f64) -> Duration {
    let micros = elapsed
        .num_microseconds()
        .unwrap_or_else(|| elapsed.num_milliseconds().saturating_mul(1000));
    Duration::microseconds((micros as f64 / speed) as i64)
}
