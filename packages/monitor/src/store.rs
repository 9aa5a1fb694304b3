//! The currently displayed snapshot.
//!
//! Poll cycles may overlap, so snapshots can arrive out of order. The store
//! hands out cycle ids in start order and only accepts a snapshot whose id is
//! newer than the last one it accepted. Once closed it accepts nothing, so a
//! fetch still in flight at teardown cannot change what is displayed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::snapshot::{CycleId, Snapshot};

/// What happened to a snapshot handed to [`SnapshotStore::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The snapshot is now current.
    Applied,
    /// A newer cycle was already applied; the snapshot was dropped.
    Superseded {
        /// Cycle currently displayed.
        latest: CycleId,
    },
    /// The store was closed; the snapshot was dropped.
    Closed,
}

#[derive(Debug)]
struct StoreState {
    latest: Option<CycleId>,
    open: bool,
}

/// Holds the current [`Snapshot`] and publishes replacements.
#[derive(Debug)]
pub struct SnapshotStore {
    next_cycle: AtomicU64,
    retain_last_known_good: bool,
    state: Mutex<StoreState>,
    current: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotStore {
    /// Creates an open store holding [`Snapshot::empty`].
    ///
    /// With `retain_last_known_good`, a feed that fails keeps its previous
    /// records (flagged stale) instead of being blanked.
    #[must_use]
    pub fn new(retain_last_known_good: bool) -> Self {
        let (current, _) = watch::channel(Arc::new(Snapshot::empty()));
        Self {
            next_cycle: AtomicU64::new(1),
            retain_last_known_good,
            state: Mutex::new(StoreState {
                latest: None,
                open: true,
            }),
            current,
        }
    }

    /// Issues the id for a cycle that is about to start. Ids increase
    /// strictly in call order.
    pub fn begin_cycle(&self) -> CycleId {
        CycleId(self.next_cycle.fetch_add(1, Ordering::SeqCst))
    }

    /// Makes `snapshot` current if the store is open and no newer cycle has
    /// been applied yet.
    pub fn apply(&self, mut snapshot: Snapshot) -> ApplyOutcome {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if !state.open {
            log::debug!("Dropping snapshot {}: store closed", snapshot.cycle);
            return ApplyOutcome::Closed;
        }
        if let Some(latest) = state.latest
            && latest >= snapshot.cycle
        {
            log::warn!(
                "Dropping snapshot {}: cycle {latest} already displayed",
                snapshot.cycle
            );
            return ApplyOutcome::Superseded { latest };
        }

        if self.retain_last_known_good {
            let previous = Arc::clone(&self.current.borrow());
            snapshot.retain_failed_from(&previous);
        }
        for kind in snapshot.health.failed() {
            log::warn!("Cycle {}: {kind} feed unavailable", snapshot.cycle);
        }

        state.latest = Some(snapshot.cycle);
        self.current.send_replace(Arc::new(snapshot));
        ApplyOutcome::Applied
    }

    /// The snapshot currently displayed.
    #[must_use]
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.borrow())
    }

    /// A receiver that is notified on every accepted snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.current.subscribe()
    }

    /// Stops accepting snapshots. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.open {
            log::debug!("Snapshot store closed");
        }
        state.open = false;
    }

    /// Whether snapshots are still accepted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .open
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(false)
    }
}
