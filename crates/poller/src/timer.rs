//! Single-shot, cancellable poll timers.
//!
//! Each poller owns exactly one [`Scheduler`]. Scheduling always cancels the
//! previous request first, and every request carries a generation number so
//! a fire that raced with a cancel is recognised as stale and dropped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::types::PollerCommand;

/// Single-shot timer capability owned by one poller.
pub trait Scheduler: Send {
    /// Arms the timer, cancelling any pending one.
    fn schedule(&mut self, delay: Duration);

    /// Cancels the pending timer, if any.
    fn cancel(&mut self);

    /// Returns `true` if a timer is armed and has not been claimed.
    fn is_pending(&self) -> bool;

    /// Consumes a fire notification. Returns `false` for stale generations.
    fn claim(&mut self, generation: u64) -> bool;
}

/// Timer backed by a tokio task that posts [`PollerCommand::TimerFired`] to
/// the owning poller's command channel.
pub struct TokioTimer {
    tx: mpsc::WeakSender<PollerCommand>,
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl TokioTimer {
    /// Creates a timer that delivers into `tx`.
    ///
    /// Only a weak handle is kept so the timer does not keep the poller's
    /// channel open.
    pub fn new(tx: &mpsc::Sender<PollerCommand>) -> Self {
        Self {
            tx: tx.downgrade(),
            generation: 0,
            cancel: None,
        }
    }
}

impl Scheduler for TokioTimer {
    fn schedule(&mut self, delay: Duration) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        let tx = self.tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    trace!(generation, "poll timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    if let Some(tx) = tx.upgrade() {
                        let _ = tx.send(PollerCommand::TimerFired { generation }).await;
                    }
                }
            }
        });
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }

    fn is_pending(&self) -> bool {
        self.cancel.is_some()
    }

    fn claim(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.cancel.is_none() {
            return false;
        }
        self.cancel = None;
        true
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A scheduler that records requests but never fires.
///
/// The owner drives fetches itself: one-shot checks, and tests that assert
/// on the requested delays. Clones share state.
#[derive(Clone, Default)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualInner>>,
}

#[derive(Default)]
struct ManualInner {
    pending: Option<Duration>,
    history: Vec<Duration>,
    cancels: usize,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay of the armed timer, if any.
    pub fn pending_delay(&self) -> Option<Duration> {
        self.lock().pending
    }

    /// Every delay ever scheduled, in order.
    pub fn history(&self) -> Vec<Duration> {
        self.lock().history.clone()
    }

    /// Number of times a pending timer was cancelled.
    pub fn cancels(&self) -> usize {
        self.lock().cancels
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualInner> {
        // A poisoned lock only means a test panicked mid-assert.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Scheduler for ManualTimer {
    fn schedule(&mut self, delay: Duration) {
        let mut inner = self.lock();
        if inner.pending.take().is_some() {
            inner.cancels += 1;
        }
        inner.pending = Some(delay);
        inner.history.push(delay);
    }

    fn cancel(&mut self) {
        let mut inner = self.lock();
        if inner.pending.take().is_some() {
            inner.cancels += 1;
        }
    }

    fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    fn claim(&mut self, _generation: u64) -> bool {
        self.lock().pending.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = TokioTimer::new(&tx);

        timer.schedule(Duration::from_secs(5));
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let cmd = rx.try_recv().unwrap();
        assert_eq!(cmd, PollerCommand::TimerFired { generation: 1 });
        assert!(timer.claim(1));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_cancels_previous() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = TokioTimer::new(&tx);

        timer.schedule(Duration::from_secs(1));
        timer.schedule(Duration::from_secs(3));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            PollerCommand::TimerFired { generation: 2 }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = TokioTimer::new(&tx);

        timer.schedule(Duration::from_secs(1));
        timer.cancel();
        assert!(!timer.is_pending());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stale_generation_not_claimed() {
        let (tx, _rx) = mpsc::channel(1);
        let mut timer = TokioTimer::new(&tx);
        timer.generation = 2;
        timer.cancel = Some(CancellationToken::new());

        assert!(!timer.claim(1));
        assert!(timer.is_pending());
        assert!(timer.claim(2));
        assert!(!timer.claim(2));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_receiver_does_not_panic() {
        let (tx, rx) = mpsc::channel(1);
        let mut timer = TokioTimer::new(&tx);
        drop(rx);
        drop(tx);
        timer.schedule(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    #[test]
    fn manual_timer_records() {
        let probe = ManualTimer::new();
        let mut timer = probe.clone();

        timer.schedule(Duration::from_secs(60));
        timer.schedule(Duration::from_secs(600));
        assert_eq!(probe.pending_delay(), Some(Duration::from_secs(600)));
        assert_eq!(
            probe.history(),
            vec![Duration::from_secs(60), Duration::from_secs(600)]
        );
        assert_eq!(probe.cancels(), 1);

        timer.cancel();
        assert!(!timer.is_pending());
        assert_eq!(probe.cancels(), 2);
        timer.cancel();
        assert_eq!(probe.cancels(), 2);
    }
}
