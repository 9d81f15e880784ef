use crate::timing::{Clock, Timer, TimerToken};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Manually advanced clock for deterministic playback tests
///
/// Clones share the same time, so a test can keep one handle while the
/// player owns another.
#[derive(Debug, Clone)]
pub struct MockClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

#[derive(Debug, Default)]
struct MockTimerState {
    next_id: u64,
    scheduled: Vec<(TimerToken, Duration)>,
    cancelled: Vec<TimerToken>,
    pending: Option<TimerToken>,
}

/// Timer that records what was scheduled instead of firing
///
/// Tests fire a wake-up by passing [`MockTimer::pending`] back to the player.
#[derive(Debug, Clone, Default)]
pub struct MockTimer {
    state: Rc<RefCell<MockTimerState>>,
}

impl MockTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding token, if any
    pub fn pending(&self) -> Option<TimerToken> {
        self.state.borrow().pending
    }

    /// Delay of the outstanding wake-up
    pub fn pending_delay(&self) -> Option<Duration> {
        let state = self.state.borrow();
        let pending = state.pending?;
        state
            .scheduled
            .iter()
            .rev()
            .find(|(token, _)| *token == pending)
            .map(|(_, delay)| *delay)
    }

    /// Every delay scheduled so far, in order
    pub fn scheduled_delays(&self) -> Vec<Duration> {
        self.state.borrow().scheduled.iter().map(|(_, delay)| *delay).collect()
    }

    pub fn cancelled(&self) -> Vec<TimerToken> {
        self.state.borrow().cancelled.clone()
    }

    /// Mark the outstanding token as delivered and return it
    pub fn fire(&self) -> Option<TimerToken> {
        self.state.borrow_mut().pending.take()
    }
}

impl Timer for MockTimer {
    fn schedule_once(&mut self, delay: Duration) -> TimerToken {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let token = TimerToken(state.next_id);
        state.scheduled.push((token, delay));
        state.pending = Some(token);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        let mut state = self.state.borrow_mut();
        state.cancelled.push(token);
        if state.pending == Some(token) {
            state.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_advances_shared_time() {
        let clock = MockClock::new();
        let handle = clock.clone();
        let start = clock.now();

        handle.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));
        assert_eq!(clock.elapsed(), Duration::from_millis(250));
    }

    #[test]
    fn test_mock_timer_tracks_pending() {
        let mut timer = MockTimer::new();
        let handle = timer.clone();

        let first = timer.schedule_once(Duration::from_secs(1));
        assert_eq!(handle.pending(), Some(first));
        assert_eq!(handle.pending_delay(), Some(Duration::from_secs(1)));

        timer.cancel(first);
        assert_eq!(handle.pending(), None);
        assert_eq!(handle.cancelled(), vec![first]);

        let second = timer.schedule_once(Duration::from_millis(5));
        assert_eq!(handle.fire(), Some(second));
        assert_eq!(handle.pending(), None);
        assert_eq!(
            handle.scheduled_delays(),
            vec![Duration::from_secs(1), Duration::from_millis(5)]
        );
    }
}
