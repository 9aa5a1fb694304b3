//! Category drill-down tables.
//!
//! One category (feed) can be open at a time. Its table lists every record
//! of that feed in the current snapshot, including records the map left out
//! for lack of coordinates.

use forest_guard_feed_models::timestamp::{NOT_AVAILABLE, display_date, display_date_time, display_time};
use forest_guard_feed_models::{FeedRecord, IotEvent, SatelliteAlert, SourceKind, UssdReport};

use crate::snapshot::Snapshot;

/// Shown in the verification column of an unverified report.
const PENDING: &str = "Pending...";

/// Category view state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryState {
    /// No table shown.
    #[default]
    Closed,
    /// The table for this feed is shown.
    Open(SourceKind),
}

/// All records of one feed, borrowed from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CategoryRows<'a> {
    /// Satellite alerts.
    Satellite(&'a [SatelliteAlert]),
    /// Acoustic sensor events.
    Iot(&'a [IotEvent]),
    /// Citizen reports.
    Ussd(&'a [UssdReport]),
}

impl CategoryRows<'_> {
    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Satellite(rows) => rows.len(),
            Self::Iot(rows) => rows.len(),
            Self::Ussd(rows) => rows.len(),
        }
    }

    /// Whether there are no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows as tagged records.
    #[must_use]
    pub fn to_records(&self) -> Vec<FeedRecord> {
        match self {
            Self::Satellite(rows) => rows.iter().cloned().map(FeedRecord::from).collect(),
            Self::Iot(rows) => rows.iter().cloned().map(FeedRecord::from).collect(),
            Self::Ussd(rows) => rows.iter().cloned().map(FeedRecord::from).collect(),
        }
    }
}

/// A formatted table, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    /// Feed shown.
    pub kind: SourceKind,
    /// Table title.
    pub title: &'static str,
    /// Column headers.
    pub columns: &'static [&'static str],
    /// One row of cells per record, in snapshot order.
    pub rows: Vec<Vec<String>>,
}

/// Tracks which category table, if any, is open.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryViewController {
    state: CategoryState,
}

impl CategoryViewController {
    /// Opens the table for `kind`, replacing any open table.
    pub fn open(&mut self, kind: SourceKind) {
        log::debug!("Opened {kind} table");
        self.state = CategoryState::Open(kind);
    }

    /// Closes the table.
    pub fn close(&mut self) {
        self.state = CategoryState::Closed;
    }

    /// The open category, if any.
    #[must_use]
    pub const fn active(&self) -> Option<SourceKind> {
        match self.state {
            CategoryState::Closed => None,
            CategoryState::Open(kind) => Some(kind),
        }
    }

    /// The raw state.
    #[must_use]
    pub const fn state(&self) -> CategoryState {
        self.state
    }

    /// All records of `kind` in `snapshot`, unfiltered.
    #[must_use]
    pub fn rows(snapshot: &Snapshot, kind: SourceKind) -> CategoryRows<'_> {
        match kind {
            SourceKind::Satellite => CategoryRows::Satellite(&snapshot.satellite_alerts),
            SourceKind::Iot => CategoryRows::Iot(&snapshot.iot_events),
            SourceKind::Ussd => CategoryRows::Ussd(&snapshot.ussd_reports),
        }
    }

    /// The formatted table for the open category, if one is open.
    #[must_use]
    pub fn table(&self, snapshot: &Snapshot) -> Option<CategoryTable> {
        self.active().map(|kind| table_for(snapshot, kind))
    }
}

/// Formats the table for `kind` from `snapshot`.
#[must_use]
pub fn table_for(snapshot: &Snapshot, kind: SourceKind) -> CategoryTable {
    let (columns, rows): (&'static [&'static str], Vec<Vec<String>>) =
        match CategoryViewController::rows(snapshot, kind) {
            CategoryRows::Satellite(alerts) => (
                &["Date", "Location (Lat/Lon)", "Confidence"],
                alerts
                    .iter()
                    .map(|alert| {
                        vec![
                            display_date(alert.alert_date.as_deref()),
                            location(alert.lat, alert.lon),
                            alert.confidence_level.to_uppercase(),
                        ]
                    })
                    .collect(),
            ),
            CategoryRows::Iot(events) => (
                &["Detected At", "Sensor ID", "Type", "Location"],
                events
                    .iter()
                    .map(|event| {
                        vec![
                            display_time(event.detected_at.as_deref()),
                            event.sensor_id.clone(),
                            event.sound_type.to_uppercase(),
                            location(event.lat, event.lon),
                        ]
                    })
                    .collect(),
            ),
            CategoryRows::Ussd(reports) => (
                &["Time", "Reporter", "Report Details", "Blockchain Verification"],
                reports
                    .iter()
                    .map(|report| {
                        let details = if report.location_text.is_empty() {
                            report.report_details.clone()
                        } else {
                            format!("{} ({})", report.report_details, report.location_text)
                        };
                        vec![
                            display_date_time(report.received_at.as_deref()),
                            report.phone_number.clone(),
                            details,
                            report
                                .blockchain_proof
                                .clone()
                                .unwrap_or_else(|| PENDING.to_string()),
                        ]
                    })
                    .collect(),
            ),
        };

    CategoryTable {
        kind,
        title: kind.table_title(),
        columns,
        rows,
    }
}

fn location(lat: Option<f64>, lon: Option<f64>) -> String {
    let part = |value: Option<f64>| value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string());
    format!("{}, {}", part(lat), part(lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::MapLayers;
    use crate::snapshot::CycleId;
    use crate::test_support::{alert, event, report};

    fn mixed_snapshot() -> Snapshot {
        Snapshot::new(
            CycleId(1),
            vec![alert(1, Some(0.0), Some(34.9)), alert(2, None, None), alert(3, Some(0.2), None)],
            vec![report(1, None, None)],
            vec![event(1, Some(0.25), Some(34.85)), event(2, None, Some(34.8))],
        )
    }

    #[test]
    fn starts_closed() {
        let view = CategoryViewController::default();
        assert_eq!(view.active(), None);
        assert_eq!(view.state(), CategoryState::Closed);
        assert!(view.table(&Snapshot::empty()).is_none());
    }

    #[test]
    fn open_replaces_and_close_clears() {
        let mut view = CategoryViewController::default();
        view.open(SourceKind::Satellite);
        view.open(SourceKind::Ussd);
        assert_eq!(view.active(), Some(SourceKind::Ussd));
        view.close();
        assert_eq!(view.active(), None);
    }

    #[test]
    fn rows_include_records_the_map_omits() {
        let snapshot = mixed_snapshot();
        let layers = MapLayers::from_snapshot(&snapshot);
        for kind in SourceKind::all() {
            let rows = CategoryViewController::rows(&snapshot, *kind);
            assert_eq!(rows.len(), snapshot.len(*kind));
            assert!(rows.len() >= layers.layer(*kind).len());
        }
        assert_eq!(CategoryViewController::rows(&snapshot, SourceKind::Satellite).len(), 3);
        assert_eq!(layers.satellite.len(), 1);
    }

    #[test]
    fn satellite_table_formats_rows() {
        let mut view = CategoryViewController::default();
        view.open(SourceKind::Satellite);
        let table = view.table(&mixed_snapshot()).unwrap();

        assert_eq!(table.title, "Deforestation Alerts (GFW)");
        assert_eq!(table.columns, &["Date", "Location (Lat/Lon)", "Confidence"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0], vec!["2024-05-01", "0, 34.9", "HIGH"]);
        assert_eq!(table.rows[1][1], "N/A, N/A");
    }

    #[test]
    fn ussd_table_marks_unverified_reports_pending() {
        let mut verified = report(2, Some(0.3), Some(34.8));
        verified.blockchain_proof = Some("0xabc".to_string());
        let snapshot = Snapshot::new(CycleId(1), Vec::new(), vec![report(1, None, None), verified], Vec::new());

        let table = table_for(&snapshot, SourceKind::Ussd);
        assert_eq!(table.title, "Community Reports");
        assert_eq!(table.rows[0][0], "2024-05-01 08:30:00");
        assert_eq!(table.rows[0][2], "Trucks loading logs near the river (Isecheno)");
        assert_eq!(table.rows[0][3], "Pending...");
        assert_eq!(table.rows[1][3], "0xabc");
    }

    #[test]
    fn iot_table_shows_time_of_detection() {
        let table = table_for(&mixed_snapshot(), SourceKind::Iot);
        assert_eq!(table.title, "Acoustic Sensor Events");
        assert_eq!(table.rows[0], vec!["02:10:00", "S-1", "CHAINSAW", "0.25, 34.85"]);
        assert_eq!(table.rows[1][3], "N/A, 34.8");
    }

    #[test]
    fn rows_convert_to_tagged_records() {
        let snapshot = mixed_snapshot();
        let records = CategoryViewController::rows(&snapshot, SourceKind::Iot).to_records();
        assert!(records.iter().all(|r| r.kind() == SourceKind::Iot));
        assert_eq!(records.len(), 2);
    }
}
