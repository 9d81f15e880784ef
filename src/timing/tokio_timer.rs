use crate::timing::{Timer, TimerToken};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Timer backed by tokio sleeps
///
/// Each wake-up is a spawned task that sleeps and then sends its token over
/// the channel returned by [`TokioTimer::new`]. Must be used inside a tokio
/// runtime.
pub struct TokioTimer {
    next_id: u64,
    tx: mpsc::UnboundedSender<TimerToken>,
    /// The outstanding wake-up
    pending: Option<(TimerToken, JoinHandle<()>)>,
}

impl TokioTimer {
    /// Create a timer and the receiver its tokens are delivered on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timer = Self {
            next_id: 0,
            tx,
            pending: None,
        };
        (timer, rx)
    }
}

impl Timer for TokioTimer {
    fn schedule_once(&mut self, delay: Duration) -> TimerToken {
        if let Some((_, handle)) = self.pending.take() {
            handle.abort();
        }

        self.next_id += 1;
        let token = TimerToken(self.next_id);
        let tx = self.tx.clone();

        debug!("Scheduling wake-up {:?} in {:?}", token, delay);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver only goes away when the player shuts down
            let _ = tx.send(token);
        });
        self.pending = Some((token, handle));
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        if self.pending.as_ref().map_or(false, |(pending, _)| *pending == token) {
            if let Some((_, handle)) = self.pending.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_is_delivered() {
        let (mut timer, mut rx) = TokioTimer::new();
        let token = timer.schedule_once(Duration::from_millis(5));
        let received = rx.recv().await.unwrap();
        assert_eq!(received, token);
    }

    #[tokio::test]
    async fn test_cancelled_token_is_not_delivered() {
        let (mut timer, mut rx) = TokioTimer::new();
        let token = timer.schedule_once(Duration::from_millis(10));
        timer.cancel(token);

        let received = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(received.is_err());
    }

    #[tokio::test]
    async fn test_rescheduling_replaces_pending_wake_up() {
        let (mut timer, mut rx) = TokioTimer::new();
        let first = timer.schedule_once(Duration::from_millis(10));
        let second = timer.schedule_once(Duration::from_millis(20));
        assert_ne!(first, second);

        assert_eq!(rx.recv().await.unwrap(), second);
        let extra = tokio::time::timeout(Duration::from_millis(40), rx.recv()).await;
        assert!(extra.is_err());
    }
}
