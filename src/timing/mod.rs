pub mod mock;
pub mod tokio_timer;

pub use mock::{MockClock, MockTimer};
pub use tokio_timer::TokioTimer;

use std::time::{Duration, Instant};

/// Handle identifying one scheduled wake-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Monotonic wall-clock source
pub trait Clock {
    fn now(&self) -> Instant;
}

/// One-shot delayed callback primitive
///
/// The owner of a timer is expected to keep at most one token outstanding
/// and to cancel it before arming another.
pub trait Timer {
    /// Arrange for `token` to be delivered once after `delay`
    fn schedule_once(&mut self, delay: Duration) -> TimerToken;

    /// Cancel a scheduled wake-up. Unknown or already delivered tokens are ignored.
    fn cancel(&mut self, token: TimerToken);
}

/// The process monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
