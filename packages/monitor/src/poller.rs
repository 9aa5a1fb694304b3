//! Fixed-interval cycle driver.
//!
//! A [`Poller`] invokes its operation once immediately and then on every
//! interval tick. Each invocation is spawned as its own task, so a cycle
//! that outlives the interval does not delay the next one; cycles may
//! overlap. After [`Poller::stop`] returns, the operation is never invoked
//! again. Cycles already in flight are not cancelled; callers guard against
//! late results themselves (see [`crate::store::SnapshotStore::close`]).

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Smallest interval accepted; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Drives an operation on a fixed interval until stopped.
#[derive(Debug)]
pub struct Poller {
    active: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Starts polling. Must be called from within a Tokio runtime.
    ///
    /// `operation` is called to create each cycle's future; the future is
    /// spawned and not awaited by the poller.
    pub fn start<F, Fut>(interval: Duration, mut operation: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let active = Arc::new(Mutex::new(true));

        log::info!("Polling every {interval:?}");

        let task = tokio::spawn({
            let active = Arc::clone(&active);
            async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    // Held while invoking so `stop` cannot return between the
                    // check and the invocation.
                    let guard = active.lock().unwrap_or_else(PoisonError::into_inner);
                    if !*guard {
                        break;
                    }
                    tokio::spawn(operation());
                    drop(guard);
                }
            }
        });

        Self { active, task }
    }

    /// Stops future invocations. Idempotent.
    pub fn stop(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if *active {
            log::info!("Polling stopped");
        }
        *active = false;
        drop(active);
        self.task.abort();
    }

    /// Whether the poller has not been stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const INTERVAL: Duration = Duration::from_millis(5000);

    fn counting() -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<()> + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let op = {
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
                std::future::ready(())
            }
        };
        (count, op)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_immediately_then_every_interval() {
        let (count, op) = counting();
        let poller = Poller::start(INTERVAL, op);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn no_invocations_after_stop() {
        let (count, op) = counting();
        let poller = Poller::start(INTERVAL, op);

        tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;
        poller.stop();
        let stopped_at = count.load(Ordering::SeqCst);
        assert!(!poller.is_running());

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(count.load(Ordering::SeqCst), stopped_at);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycles_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let poller = Poller::start(INTERVAL, {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            move || {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(INTERVAL * 3).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            }
        });

        tokio::time::sleep(INTERVAL * 2 + Duration::from_millis(1)).await;
        assert_eq!(peak.load(Ordering::SeqCst), 3);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_stops_it() {
        let (count, op) = counting();
        let poller = Poller::start(INTERVAL, op);
        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(poller);

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
