//! Record builders and in-memory feeds shared by the unit tests.

use std::time::Duration;

use async_trait::async_trait;
use forest_guard_feed::{FeedError, FeedSource, SourceFetcher};
use forest_guard_feed_models::{IotEvent, RecordId, SatelliteAlert, SourceKind, UssdReport};

use crate::aggregator::Aggregator;
use crate::config::Viewport;
use crate::layers::{MapSurface, MarkerLayer};
use crate::selection::Popup;

pub fn alert(id: i64, lat: Option<f64>, lon: Option<f64>) -> SatelliteAlert {
    SatelliteAlert {
        id: RecordId::Int(id),
        lat,
        lon,
        alert_date: Some("2024-05-01".to_string()),
        confidence_level: "high".to_string(),
    }
}

pub fn report(id: i64, lat: Option<f64>, lon: Option<f64>) -> UssdReport {
    UssdReport {
        id: RecordId::Int(id),
        lat,
        lon,
        phone_number: "+254711000111".to_string(),
        report_details: "Trucks loading logs near the river".to_string(),
        location_text: "Isecheno".to_string(),
        received_at: Some("2024-05-01T08:30:00Z".to_string()),
        blockchain_proof: None,
    }
}

pub fn event(id: i64, lat: Option<f64>, lon: Option<f64>) -> IotEvent {
    IotEvent {
        id: RecordId::Int(id),
        lat,
        lon,
        sensor_id: format!("S-{id}"),
        sound_type: "chainsaw".to_string(),
        detected_at: Some("2024-05-01T02:10:00Z".to_string()),
    }
}

/// Serves a fixed record list, optionally after a delay.
pub struct StubFeed<R> {
    pub kind: SourceKind,
    pub records: Vec<R>,
    pub delay: Duration,
}

impl<R> StubFeed<R> {
    pub fn new(kind: SourceKind, records: Vec<R>) -> Self {
        Self {
            kind,
            records,
            delay: Duration::ZERO,
        }
    }

    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl<R: Clone + Send + Sync + 'static> FeedSource<R> for StubFeed<R> {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self) -> Result<Vec<R>, FeedError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.records.clone())
    }
}

/// Always fails with an HTTP 500.
pub struct FailingFeed(pub SourceKind);

#[async_trait]
impl<R: Send + 'static> FeedSource<R> for FailingFeed {
    fn kind(&self) -> SourceKind {
        self.0
    }

    async fn fetch(&self) -> Result<Vec<R>, FeedError> {
        Err(FeedError::Status {
            url: format!("http://localhost:8000/{}", self.0),
            status: 500,
        })
    }
}

/// An aggregator over fixed record lists.
pub fn stub_aggregator(
    satellite: Vec<SatelliteAlert>,
    ussd: Vec<UssdReport>,
    iot: Vec<IotEvent>,
) -> Aggregator {
    Aggregator::new(
        SourceFetcher::new(StubFeed::new(SourceKind::Satellite, satellite)),
        SourceFetcher::new(StubFeed::new(SourceKind::Ussd, ussd)),
        SourceFetcher::new(StubFeed::new(SourceKind::Iot, iot)),
    )
}

/// Records what a renderer drew.
#[derive(Default)]
pub struct RecordingSurface {
    pub viewport: Option<Viewport>,
    pub clears: usize,
    pub drawn: Vec<(SourceKind, Vec<String>)>,
    pub popup: Option<Popup>,
}

impl MapSurface for RecordingSurface {
    fn set_viewport(&mut self, viewport: &Viewport) {
        self.viewport = Some(*viewport);
    }

    fn clear_markers(&mut self) {
        self.clears += 1;
        self.drawn.clear();
    }

    fn draw_layer(&mut self, layer: &MarkerLayer) {
        self.drawn.push((
            layer.kind,
            layer.markers.iter().map(|m| m.key.clone()).collect(),
        ));
    }

    fn show_popup(&mut self, popup: Option<&Popup>) {
        self.popup = popup.cloned();
    }
}
