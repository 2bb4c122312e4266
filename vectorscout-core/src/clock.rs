//! Elapsed-time clock for an in-progress action.
//!
//! The clock starts when an action detail entry opens and is frozen by the
//! first [`ActionClock::stop`]. A display can follow it through
//! [`ActionClock::spawn_ticker`], which publishes the elapsed time every
//! [`TICK_INTERVAL`] on a `watch` channel until stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Refresh period of the elapsed display.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Monotonic stopwatch with an idempotent stop.
#[derive(Debug, Clone)]
pub struct ActionClock {
    started: Instant,
    frozen_ms: Arc<OnceLock<u64>>,
}

impl ActionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            frozen_ms: Arc::new(OnceLock::new()),
        }
    }

    /// Elapsed milliseconds; constant once stopped.
    pub fn elapsed_ms(&self) -> u64 {
        match self.frozen_ms.get() {
            Some(ms) => *ms,
            None => self.started.elapsed().as_millis() as u64,
        }
    }

    /// Freeze the clock. Later calls return the first frozen value.
    pub fn stop(&self) -> u64 {
        *self
            .frozen_ms
            .get_or_init(|| self.started.elapsed().as_millis() as u64)
    }

    pub fn is_running(&self) -> bool {
        self.frozen_ms.get().is_none()
    }

    /// Publish elapsed time every [`TICK_INTERVAL`] until the clock or the
    /// returned handle is stopped. Must be called inside a tokio runtime.
    pub fn spawn_ticker(&self) -> TickerHandle {
        let (tx, rx) = watch::channel(self.elapsed_ms());
        let cancelled = Arc::new(AtomicBool::new(false));

        let clock = self.clone();
        let flag = Arc::clone(&cancelled);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                let elapsed = clock.elapsed_ms();
                if tx.send(elapsed).is_err() {
                    break;
                }
                if !clock.is_running() {
                    break;
                }
            }
            tracing::trace!("action clock ticker finished");
        });

        TickerHandle {
            cancelled,
            elapsed: rx,
            task: Some(task),
        }
    }
}

/// Handle to a running ticker. Dropping it stops the ticker.
#[derive(Debug)]
pub struct TickerHandle {
    cancelled: Arc<AtomicBool>,
    elapsed: watch::Receiver<u64>,
    task: Option<JoinHandle<()>>,
}

impl TickerHandle {
    /// Receiver of elapsed-millisecond updates.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed.clone()
    }

    /// Most recently published elapsed value.
    pub fn latest(&self) -> u64 {
        *self.elapsed.borrow()
    }

    /// Stop ticking. Safe to call more than once.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Stop and wait for the ticker task to exit.
    pub async fn join(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_idempotent() {
        let clock = ActionClock::start();
        std::thread::sleep(Duration::from_millis(20));
        let first = clock.stop();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(clock.stop(), first);
        assert_eq!(clock.elapsed_ms(), first);
        assert!(first >= 20);
        assert!(!clock.is_running());
    }

    #[tokio::test]
    async fn test_ticker_publishes_elapsed() {
        let clock = ActionClock::start();
        let ticker = clock.spawn_ticker();
        let mut rx = ticker.subscribe();

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(rx.has_changed().unwrap());
        let seen = *rx.borrow_and_update();
        assert!(seen >= 100, "expected at least one tick, saw {seen}");

        ticker.stop();
        ticker.stop();
        assert!(ticker.is_stopped());
        ticker.join().await;
    }

    #[tokio::test]
    async fn test_ticker_ends_when_clock_stops() {
        let clock = ActionClock::start();
        let ticker = clock.spawn_ticker();
        let frozen = clock.stop();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(ticker.latest(), frozen);
        ticker.join().await;
    }
}
