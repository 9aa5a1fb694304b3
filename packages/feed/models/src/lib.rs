#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types for the three forest-threat feeds.
//!
//! Each provider (satellite deforestation alerts, citizen USSD reports, and
//! acoustic IoT sensor detections) returns a JSON array of one of the record
//! types below. Coordinates are optional on every record: entities without a
//! position still show up in the drill-down tables, they just never get a map
//! marker.

pub mod timestamp;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which upstream feed a record came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    /// Satellite deforestation alerts (GFW)
    Satellite,
    /// Acoustic sensor detections
    Iot,
    /// Citizen reports submitted over USSD
    Ussd,
}

impl SourceKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Satellite, Self::Iot, Self::Ussd]
    }

    /// Prefix used to build map marker keys (e.g. `sat-42`).
    #[must_use]
    pub const fn marker_prefix(self) -> &'static str {
        match self {
            Self::Satellite => "sat",
            Self::Iot => "iot",
            Self::Ussd => "ussd",
        }
    }

    /// Short label shown in the header of a marker popup.
    #[must_use]
    pub const fn popup_label(self) -> &'static str {
        match self {
            Self::Satellite => "Sat Alert",
            Self::Iot => "Audio Detect",
            Self::Ussd => "Citizen Report",
        }
    }

    /// Label shown on the quick-stats card for this feed.
    #[must_use]
    pub const fn stat_label(self) -> &'static str {
        match self {
            Self::Satellite => "Alerts",
            Self::Iot => "Sensors",
            Self::Ussd => "Reports",
        }
    }

    /// Title of the drill-down table for this feed.
    #[must_use]
    pub const fn table_title(self) -> &'static str {
        match self {
            Self::Satellite => "Deforestation Alerts (GFW)",
            Self::Iot => "Acoustic Sensor Events",
            Self::Ussd => "Community Reports",
        }
    }
}

/// A record identifier as sent by the provider.
///
/// Providers are inconsistent about whether ids are numeric or textual, so
/// both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric id (e.g. a database serial)
    Int(i64),
    /// Textual id (e.g. a UUID)
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// A record that may carry a map position.
pub trait Locatable {
    /// Latitude, if the provider sent one.
    fn lat(&self) -> Option<f64>;

    /// Longitude, if the provider sent one.
    fn lon(&self) -> Option<f64>;

    /// Returns the record's position when both coordinate fields are
    /// present.
    ///
    /// A value of exactly `0.0` is a real position (the equator runs
    /// through the monitored forest region) and is kept.
    fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            lat: self.lat()?,
            lon: self.lon()?,
        })
    }
}

/// Decodes a text field, treating an explicit `null` like a missing key.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A satellite-detected deforestation alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteAlert {
    /// Provider id.
    pub id: RecordId,
    /// Latitude (WGS84). `None` if the provider omitted it.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude (WGS84). `None` if the provider omitted it.
    #[serde(default)]
    pub lon: Option<f64>,
    /// Date of the alert as sent by the provider.
    #[serde(default)]
    pub alert_date: Option<String>,
    /// Confidence bucket (e.g. `"high"`, `"nominal"`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub confidence_level: String,
}

/// A citizen field report received over USSD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UssdReport {
    /// Provider id.
    pub id: RecordId,
    /// Latitude (WGS84). `None` if the report could not be located.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude (WGS84). `None` if the report could not be located.
    #[serde(default)]
    pub lon: Option<f64>,
    /// Reporter's phone number.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone_number: String,
    /// Free-text description of what was observed.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub report_details: String,
    /// Free-text location given by the reporter.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location_text: String,
    /// When the report was received.
    #[serde(default)]
    pub received_at: Option<String>,
    /// On-chain proof hash. Present only for verified reports.
    #[serde(default)]
    pub blockchain_proof: Option<String>,
}

impl UssdReport {
    /// Whether the report has a provenance proof attached.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.blockchain_proof.is_some()
    }
}

/// An acoustic detection from a field sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IotEvent {
    /// Provider id.
    pub id: RecordId,
    /// Latitude (WGS84). `None` if the sensor position is unknown.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude (WGS84). `None` if the sensor position is unknown.
    #[serde(default)]
    pub lon: Option<f64>,
    /// Hardware id of the detecting sensor.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sensor_id: String,
    /// Classified sound (e.g. `"chainsaw"`, `"gunshot"`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sound_type: String,
    /// When the sound was detected.
    #[serde(default)]
    pub detected_at: Option<String>,
}

macro_rules! impl_locatable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Locatable for $ty {
                fn lat(&self) -> Option<f64> {
                    self.lat
                }

                fn lon(&self) -> Option<f64> {
                    self.lon
                }
            }
        )+
    };
}

impl_locatable!(SatelliteAlert, UssdReport, IotEvent);

/// Any record from any feed, tagged with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedRecord {
    /// A satellite alert.
    Satellite(SatelliteAlert),
    /// An acoustic sensor event.
    Iot(IotEvent),
    /// A citizen report.
    Ussd(UssdReport),
}

impl FeedRecord {
    /// The feed this record came from.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Satellite(_) => SourceKind::Satellite,
            Self::Iot(_) => SourceKind::Iot,
            Self::Ussd(_) => SourceKind::Ussd,
        }
    }

    /// The provider id of the wrapped record.
    #[must_use]
    pub const fn id(&self) -> &RecordId {
        match self {
            Self::Satellite(alert) => &alert.id,
            Self::Iot(event) => &event.id,
            Self::Ussd(report) => &report.id,
        }
    }

    /// Marker key, unique across all layers (e.g. `ussd-7`).
    #[must_use]
    pub fn marker_key(&self) -> String {
        format!("{}-{}", self.kind().marker_prefix(), self.id())
    }
}

impl Locatable for FeedRecord {
    fn lat(&self) -> Option<f64> {
        match self {
            Self::Satellite(alert) => alert.lat,
            Self::Iot(event) => event.lat,
            Self::Ussd(report) => report.lat,
        }
    }

    fn lon(&self) -> Option<f64> {
        match self {
            Self::Satellite(alert) => alert.lon,
            Self::Iot(event) => event.lon,
            Self::Ussd(report) => report.lon,
        }
    }
}

impl From<SatelliteAlert> for FeedRecord {
    fn from(value: SatelliteAlert) -> Self {
        Self::Satellite(value)
    }
}

impl From<IotEvent> for FeedRecord {
    fn from(value: IotEvent) -> Self {
        Self::Iot(value)
    }
}

impl From<UssdReport> for FeedRecord {
    fn from(value: UssdReport) -> Self {
        Self::Ussd(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_round_trips_lowercase() {
        assert_eq!(SourceKind::Satellite.to_string(), "satellite");
        assert_eq!("ussd".parse::<SourceKind>().unwrap(), SourceKind::Ussd);
        assert!("radar".parse::<SourceKind>().is_err());
    }

    #[test]
    fn decodes_numeric_and_text_ids() {
        let alert: SatelliteAlert =
            serde_json::from_str(r#"{"id": 1, "lat": 0.2, "lon": 34.9, "confidence_level": "high"}"#)
                .unwrap();
        assert_eq!(alert.id, RecordId::Int(1));

        let event: IotEvent =
            serde_json::from_str(r#"{"id": "a1b2", "sensor_id": "S-9", "sound_type": "chainsaw"}"#)
                .unwrap();
        assert_eq!(event.id, RecordId::Text("a1b2".to_string()));
        assert_eq!(event.id.to_string(), "a1b2");
    }

    #[test]
    fn missing_and_null_coordinates_decode_as_none() {
        let report: UssdReport =
            serde_json::from_str(r#"{"id": 3, "lat": null, "phone_number": "+254700000000"}"#)
                .unwrap();
        assert!(report.lat.is_none());
        assert!(report.lon.is_none());
        assert!(report.coordinates().is_none());
        assert!(!report.is_verified());
    }

    #[test]
    fn zero_coordinates_are_a_position() {
        let alert: SatelliteAlert =
            serde_json::from_str(r#"{"id": 1, "lat": 0, "lon": 34.9, "confidence_level": "high"}"#)
                .unwrap();
        let coords = alert.coordinates().unwrap();
        assert!(coords.lat.abs() < f64::EPSILON);
        assert!((coords.lon - 34.9).abs() < f64::EPSILON);
    }

    #[test]
    fn one_missing_coordinate_means_no_position() {
        let event: IotEvent =
            serde_json::from_str(r#"{"id": 4, "lat": 0.25, "sensor_id": "S-1"}"#).unwrap();
        assert!(event.coordinates().is_none());
    }

    #[test]
    fn feed_record_marker_keys_are_prefixed_by_kind() {
        let report: UssdReport = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        let record = FeedRecord::from(report);
        assert_eq!(record.kind(), SourceKind::Ussd);
        assert_eq!(record.marker_key(), "ussd-7");
    }

    #[test]
    fn null_text_fields_do_not_reject_the_batch() {
        let reports: Vec<UssdReport> = serde_json::from_str(
            r#"[
                {"id": 1, "lat": 0.3, "lon": 34.8, "phone_number": "+254700000001", "report_details": "Logging truck", "location_text": "Isecheno", "received_at": "2024-05-01T10:00:00Z"},
                {"id": 2, "phone_number": null, "report_details": null, "location_text": null, "received_at": null}
            ]"#,
        )
        .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].location_text, "Isecheno");
        assert_eq!(reports[1].location_text, "");
        assert_eq!(reports[1].phone_number, "");
        assert!(reports[1].received_at.is_none());

        let alert: SatelliteAlert =
            serde_json::from_str(r#"{"id": 5, "confidence_level": null}"#).unwrap();
        assert_eq!(alert.confidence_level, "");

        let event: IotEvent =
            serde_json::from_str(r#"{"id": 6, "sensor_id": null, "sound_type": null}"#).unwrap();
        assert_eq!(event.sensor_id, "");
        assert_eq!(event.sound_type, "");
    }

    #[test]
    fn ignores_unknown_provider_fields() {
        let alert: SatelliteAlert = serde_json::from_str(
            r#"{"id": 9, "lat": 0.3, "lon": 34.8, "confidence_level": "nominal", "area_ha": 1.2}"#,
        )
        .unwrap();
        assert_eq!(alert.confidence_level, "nominal");
    }
}
