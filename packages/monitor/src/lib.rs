#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Situational-awareness state for the forest threat map.
//!
//! A [`Monitor`] polls the three threat feeds on a fixed interval, combines
//! each cycle into a [`Snapshot`] and publishes it through a
//! [`SnapshotStore`]. Everything the operator sees is derived from the
//! current snapshot: marker layers ([`layers`]), the popup of the selected
//! marker ([`selection`]) and the drill-down tables ([`category`]).

pub mod aggregator;
pub mod boundary;
pub mod category;
pub mod config;
pub mod escalation;
pub mod layers;
pub mod poller;
pub mod selection;
pub mod snapshot;
pub mod store;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

pub use aggregator::Aggregator;
pub use config::{ConfigError, MonitorConfig};
pub use forest_guard_feed::FeedStatus;
pub use poller::Poller;
pub use snapshot::{CycleId, Snapshot};
pub use store::{ApplyOutcome, SnapshotStore};

/// Owns the poll loop and the snapshot it feeds.
pub struct Monitor {
    aggregator: Arc<Aggregator>,
    store: Arc<SnapshotStore>,
    interval: Duration,
    poller: Option<Poller>,
}

impl Monitor {
    /// Creates a stopped monitor.
    #[must_use]
    pub fn new(aggregator: Aggregator, store: SnapshotStore, interval: Duration) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            store: Arc::new(store),
            interval,
            poller: None,
        }
    }

    /// Creates a stopped monitor reading the feeds named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`forest_guard_feed::FeedError`] if the HTTP client cannot be
    /// built.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, forest_guard_feed::FeedError> {
        Ok(Self::new(
            Aggregator::from_config(config)?,
            SnapshotStore::new(config.retain_last_known_good),
            config.poll_interval(),
        ))
    }

    /// Starts polling: one cycle now, then one per interval. Does nothing if
    /// already polling or after [`Self::stop`].
    pub fn start(&mut self) {
        if self.poller.is_some() {
            return;
        }
        if !self.store.is_open() {
            log::warn!("Monitor already stopped; not restarting");
            return;
        }

        let aggregator = Arc::clone(&self.aggregator);
        let store = Arc::clone(&self.store);
        self.poller = Some(Poller::start(self.interval, move || {
            let aggregator = Arc::clone(&aggregator);
            let store = Arc::clone(&store);
            // Issued here, not in the spawned future, so ids follow start order.
            let cycle = store.begin_cycle();
            async move {
                let snapshot = aggregator.collect(cycle).await;
                store.apply(snapshot);
            }
        }));
    }

    /// Stops polling and freezes the displayed snapshot. Cycles still in
    /// flight finish but their results are discarded. Idempotent.
    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.store.close();
    }

    /// Whether the poll loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_running)
    }

    /// Runs one cycle outside the poll loop and waits for it.
    pub async fn refresh(&self) -> ApplyOutcome {
        let cycle = self.store.begin_cycle();
        let snapshot = self.aggregator.collect(cycle).await;
        self.store.apply(snapshot)
    }

    /// The store holding the displayed snapshot.
    #[must_use]
    pub const fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// The snapshot currently displayed.
    #[must_use]
    pub fn current(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    /// A receiver notified on every accepted snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.store.subscribe()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}
