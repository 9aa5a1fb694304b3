//! Poll-cycle snapshots.
//!
//! A [`Snapshot`] is the combined result of one poll cycle across all three
//! feeds. Every sequence is always present (possibly empty), and a new
//! snapshot replaces the previous one wholesale.

use chrono::{DateTime, Utc};
use forest_guard_feed::{FeedOutcome, FeedStatus};
use forest_guard_feed_models::{IotEvent, SatelliteAlert, SourceKind, UssdReport};
use serde::Serialize;

/// Monotonically increasing poll cycle number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct CycleId(pub u64);

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How one feed fared in the cycle that produced a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHealth {
    /// Outcome of this cycle's read.
    pub status: FeedStatus,
    /// `true` when the records were carried over from an earlier cycle
    /// because this cycle's read failed.
    pub stale: bool,
}

impl SourceHealth {
    /// A fresh, successful read.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: FeedStatus::Ok,
            stale: false,
        }
    }

    const fn fresh(status: FeedStatus) -> Self {
        Self {
            status,
            stale: false,
        }
    }
}

impl Default for SourceHealth {
    fn default() -> Self {
        Self::ok()
    }
}

/// Per-feed health for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedHealth {
    /// Satellite feed.
    pub satellite: SourceHealth,
    /// USSD feed.
    pub ussd: SourceHealth,
    /// Acoustic sensor feed.
    pub iot: SourceHealth,
}

impl FeedHealth {
    /// Health of the given feed.
    #[must_use]
    pub const fn get(&self, kind: SourceKind) -> &SourceHealth {
        match kind {
            SourceKind::Satellite => &self.satellite,
            SourceKind::Iot => &self.iot,
            SourceKind::Ussd => &self.ussd,
        }
    }

    /// Feeds whose read failed this cycle.
    #[must_use]
    pub fn failed(&self) -> Vec<SourceKind> {
        SourceKind::all()
            .iter()
            .copied()
            .filter(|kind| !self.get(*kind).status.is_ok())
            .collect()
    }
}

/// One quick-stats counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCard {
    /// Feed the card counts; activating the card opens this category.
    pub kind: SourceKind,
    /// Card label.
    pub label: &'static str,
    /// Number of records in the current snapshot.
    pub count: usize,
}

/// The immutable combined result of one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Cycle that produced this snapshot. `CycleId(0)` for the initial
    /// empty snapshot.
    pub cycle: CycleId,
    /// When the cycle finished.
    pub fetched_at: DateTime<Utc>,
    /// Satellite alerts in provider order.
    pub satellite_alerts: Vec<SatelliteAlert>,
    /// USSD reports in provider order.
    pub ussd_reports: Vec<UssdReport>,
    /// Acoustic sensor events in provider order.
    pub iot_events: Vec<IotEvent>,
    /// Per-feed health.
    pub health: FeedHealth,
}

impl Snapshot {
    /// The snapshot shown before the first cycle completes.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(CycleId::default(), Vec::new(), Vec::new(), Vec::new())
    }

    /// A snapshot from three record sequences, all considered healthy.
    #[must_use]
    pub fn new(
        cycle: CycleId,
        satellite_alerts: Vec<SatelliteAlert>,
        ussd_reports: Vec<UssdReport>,
        iot_events: Vec<IotEvent>,
    ) -> Self {
        Self {
            cycle,
            fetched_at: Utc::now(),
            satellite_alerts,
            ussd_reports,
            iot_events,
            health: FeedHealth::default(),
        }
    }

    /// Number of records for the given feed.
    #[must_use]
    pub fn len(&self, kind: SourceKind) -> usize {
        match kind {
            SourceKind::Satellite => self.satellite_alerts.len(),
            SourceKind::Iot => self.iot_events.len(),
            SourceKind::Ussd => self.ussd_reports.len(),
        }
    }

    /// Whether all three sequences are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        SourceKind::all().iter().all(|kind| self.len(*kind) == 0)
    }

    /// Quick-stats counters, in header order (alerts, reports, sensors).
    #[must_use]
    pub fn stat_cards(&self) -> [StatCard; 3] {
        [SourceKind::Satellite, SourceKind::Ussd, SourceKind::Iot].map(|kind| StatCard {
            kind,
            label: kind.stat_label(),
            count: self.len(kind),
        })
    }

    /// Substitutes `previous`'s records for every feed that failed in this
    /// snapshot, flagging them stale. Feeds that succeeded are untouched,
    /// even when they came back empty.
    pub fn retain_failed_from(&mut self, previous: &Self) {
        if !self.health.satellite.status.is_ok() {
            self.satellite_alerts.clone_from(&previous.satellite_alerts);
            self.health.satellite.stale = true;
        }
        if !self.health.ussd.status.is_ok() {
            self.ussd_reports.clone_from(&previous.ussd_reports);
            self.health.ussd.stale = true;
        }
        if !self.health.iot.status.is_ok() {
            self.iot_events.clone_from(&previous.iot_events);
            self.health.iot.stale = true;
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Combines the three reads of one cycle into a snapshot.
///
/// Pure and total: each outcome's records are used as-is (a failed read has
/// already been degraded to an empty list) and its status is recorded in
/// [`Snapshot::health`].
#[must_use]
pub fn aggregate(
    cycle: CycleId,
    satellite: FeedOutcome<SatelliteAlert>,
    ussd: FeedOutcome<UssdReport>,
    iot: FeedOutcome<IotEvent>,
) -> Snapshot {
    Snapshot {
        cycle,
        fetched_at: Utc::now(),
        satellite_alerts: satellite.records,
        ussd_reports: ussd.records,
        iot_events: iot.records,
        health: FeedHealth {
            satellite: SourceHealth::fresh(satellite.status),
            ussd: SourceHealth::fresh(ussd.status),
            iot: SourceHealth::fresh(iot.status),
        },
    }
}
