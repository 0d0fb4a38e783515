/// Periodic sweep scheduling
///
/// Runs the trash sweep on a fixed interval, with a short startup delay so a
/// freshly booted process finishes migrations and warms its pool before the
/// first pass. Cancellation is cooperative via a [`CancellationToken`]: the
/// scheduler never interrupts a pass mid-flight, it stops between passes.
///
/// # Example
///
/// ```no_run
/// use taskdeck_sweeper::scheduler::SweepScheduler;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(pool: sqlx::PgPool) {
/// let cancel = CancellationToken::new();
/// let handle = SweepScheduler::new().spawn(pool, cancel.clone());
///
/// // ... on shutdown:
/// cancel.cancel();
/// let _ = handle.await;
/// # }
/// ```

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::sweep::sweep_trash;

/// Delay before the first pass after startup
pub const STARTUP_DELAY: Duration = Duration::from_secs(5);

/// Interval between passes
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Periodic trash sweep scheduler
#[derive(Debug, Clone)]
pub struct SweepScheduler {
    startup_delay: Duration,
    interval: Duration,
}

impl Default for SweepScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepScheduler {
    /// Creates a scheduler with the default cadence
    pub fn new() -> Self {
        Self {
            startup_delay: STARTUP_DELAY,
            interval: SWEEP_INTERVAL,
        }
    }

    /// Creates a scheduler with a custom cadence
    pub fn with_cadence(startup_delay: Duration, interval: Duration) -> Self {
        Self {
            startup_delay,
            interval,
        }
    }

    /// Spawns the sweep loop against a database pool
    ///
    /// Returns the join handle so shutdown can wait for the loop to exit.
    pub fn spawn(&self, pool: PgPool, cancel: CancellationToken) -> JoinHandle<()> {
        self.spawn_with(cancel, move || {
            let pool = pool.clone();
            async move {
                if let Err(err) = sweep_trash(&pool, Utc::now()).await {
                    tracing::error!("Trash sweep pass failed: {}", err);
                }
            }
        })
    }

    /// Spawns the loop with an arbitrary pass body
    ///
    /// Split out from [`spawn`](Self::spawn) so timing behavior is testable
    /// without a database.
    pub fn spawn_with<F, Fut>(&self, cancel: CancellationToken, mut pass: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let startup_delay = self.startup_delay;
        let interval = self.interval;

        tokio::spawn(async move {
            tokio::select! {
                _ = sleep(startup_delay) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("Sweep scheduler cancelled before first pass");
                    return;
                }
            }

            loop {
                pass().await;

                tokio::select! {
                    _ = sleep(interval) => {}
                    _ = cancel.cancelled() => {
                        tracing::info!("Sweep scheduler shutting down");
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_startup_delay() {
        let scheduler =
            SweepScheduler::with_cadence(Duration::from_secs(5), Duration::from_secs(3600));
        let cancel = CancellationToken::new();
        let count = Arc::new(AtomicUsize::new(0));

        let passes = count.clone();
        let handle = scheduler.spawn_with(cancel.clone(), move || {
            let passes = passes.clone();
            async move {
                passes.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeats_on_interval() {
        let scheduler =
            SweepScheduler::with_cadence(Duration::from_secs(1), Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let count = Arc::new(AtomicUsize::new(0));

        let passes = count.clone();
        let handle = scheduler.spawn_with(cancel.clone(), move || {
            let passes = passes.clone();
            async move {
                passes.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_pass() {
        let scheduler =
            SweepScheduler::with_cadence(Duration::from_secs(60), Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let count = Arc::new(AtomicUsize::new(0));

        let passes = count.clone();
        let handle = scheduler.spawn_with(cancel.clone(), move || {
            let passes = passes.clone();
            async move {
                passes.fetch_add(1, Ordering::SeqCst);
            }
        });

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_cadence() {
        assert_eq!(STARTUP_DELAY, Duration::from_secs(5));
        assert_eq!(SWEEP_INTERVAL, Duration::from_secs(3600));
    }
}
