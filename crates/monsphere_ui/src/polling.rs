//! Cancellable fixed-period polling.
//!
//! A poll runs on a fixed period for as long as its [`PollHandle`] lives.
//! Views keep the handle in a field, so leaving a page stops its poll.
//! There is no backoff: a failing poll keeps its period.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// A running poll. Dropping it stops the poll.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
    period: Duration,
}

impl PollHandle {
    /// Runs `tick` every `period`, first after one full period.
    ///
    /// Must be called inside a tokio runtime. A zero period is raised to
    /// one millisecond.
    pub fn every<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick().await;
            }
        });
        Self { task, period }
    }

    /// Poll period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Returns true until the poll is stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_period_and_stops_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = PollHandle::every(Duration::from_secs(5), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        for _ in 0..2 {
            time::advance(Duration::from_secs(5)).await;
            settle().await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 3);

        drop(handle);
        settle().await;
        time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
