//! Marker layers derived from a snapshot.
//!
//! Each feed gets its own layer. A record becomes a marker only when both of
//! its coordinate fields are present; records without a position are left
//! off the map but stay in the snapshot (and therefore in the category
//! tables).

use forest_guard_feed_models::{Coordinates, FeedRecord, Locatable, SourceKind};

use crate::config::Viewport;
use crate::selection::{MapEvent, Popup, SelectionController};
use crate::snapshot::Snapshot;

/// Which point of the marker icon sits on the coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAnchor {
    /// Icon centered on the position.
    Center,
    /// Icon's bottom edge (pin tip) on the position.
    Bottom,
}

impl MarkerAnchor {
    /// Anchor used for a feed's markers.
    #[must_use]
    pub const fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Satellite | SourceKind::Iot => Self::Center,
            SourceKind::Ussd => Self::Bottom,
        }
    }
}

/// A renderable point for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Key unique across all layers (e.g. `sat-12`).
    pub key: String,
    /// Where the marker is drawn.
    pub position: Coordinates,
    /// Icon anchor.
    pub anchor: MarkerAnchor,
    /// The full source record, handed to the selection on click.
    pub record: FeedRecord,
}

impl Marker {
    /// Builds a marker for `record`, or `None` if it has no position.
    #[must_use]
    pub fn for_record(record: FeedRecord) -> Option<Self> {
        let position = record.coordinates()?;
        Some(Self {
            key: record.marker_key(),
            position,
            anchor: MarkerAnchor::for_kind(record.kind()),
            record,
        })
    }

    /// Feed this marker belongs to.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        self.record.kind()
    }

    /// The event a click on this marker produces.
    #[must_use]
    pub fn click(&self) -> MapEvent {
        MapEvent::MarkerClicked(self.record.clone())
    }
}

/// All markers for one feed.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLayer {
    /// Feed the layer shows.
    pub kind: SourceKind,
    /// Markers in snapshot order.
    pub markers: Vec<Marker>,
}

impl MarkerLayer {
    /// Builds the layer for `kind` from its records.
    #[must_use]
    pub fn build<T>(kind: SourceKind, records: &[T]) -> Self
    where
        T: Clone + Into<FeedRecord>,
    {
        let markers = records
            .iter()
            .cloned()
            .filter_map(|record| Marker::for_record(record.into()))
            .collect();
        Self { kind, markers }
    }

    /// Number of markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the layer has no markers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Finds a marker by key.
    #[must_use]
    pub fn marker(&self, key: &str) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.key == key)
    }
}

/// The three marker layers for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayers {
    /// Satellite alert markers.
    pub satellite: MarkerLayer,
    /// Acoustic sensor markers.
    pub iot: MarkerLayer,
    /// Citizen report markers.
    pub ussd: MarkerLayer,
}

impl MapLayers {
    /// Derives all layers from `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            satellite: MarkerLayer::build(SourceKind::Satellite, &snapshot.satellite_alerts),
            iot: MarkerLayer::build(SourceKind::Iot, &snapshot.iot_events),
            ussd: MarkerLayer::build(SourceKind::Ussd, &snapshot.ussd_reports),
        }
    }

    /// The layer for `kind`.
    #[must_use]
    pub const fn layer(&self, kind: SourceKind) -> &MarkerLayer {
        match kind {
            SourceKind::Satellite => &self.satellite,
            SourceKind::Iot => &self.iot,
            SourceKind::Ussd => &self.ussd,
        }
    }

    /// Layers in draw order (satellite, IoT, USSD on top).
    #[must_use]
    pub fn iter(&self) -> [&MarkerLayer; 3] {
        [&self.satellite, &self.iot, &self.ussd]
    }

    /// Finds a marker by key across all layers.
    #[must_use]
    pub fn marker(&self, key: &str) -> Option<&Marker> {
        self.iter().into_iter().find_map(|layer| layer.marker(key))
    }

    /// Total markers across all layers.
    #[must_use]
    pub fn total(&self) -> usize {
        self.iter().iter().map(|layer| layer.len()).sum()
    }
}

/// The external map/terrain engine the layers are drawn on.
pub trait MapSurface {
    /// Sets the initial camera. Called once when the renderer mounts.
    fn set_viewport(&mut self, viewport: &Viewport);

    /// Removes every marker drawn so far.
    fn clear_markers(&mut self);

    /// Draws one layer's markers.
    fn draw_layer(&mut self, layer: &MarkerLayer);

    /// Shows `popup`, or hides the popup when `None`.
    fn show_popup(&mut self, popup: Option<&Popup>);
}

/// Draws snapshot layers and the active popup onto a [`MapSurface`].
#[derive(Debug, Clone, Copy)]
pub struct MapLayerRenderer {
    viewport: Viewport,
}

impl MapLayerRenderer {
    /// Creates a renderer with the given initial camera.
    #[must_use]
    pub const fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    /// Hands the initial camera to the surface.
    pub fn mount(&self, surface: &mut impl MapSurface) {
        surface.set_viewport(&self.viewport);
    }

    /// Replaces everything on `surface` with the layers of `snapshot` and
    /// the popup of the current selection. Returns the layers drawn so that
    /// the caller can resolve clicks against them.
    pub fn render(
        &self,
        snapshot: &Snapshot,
        selection: &SelectionController,
        surface: &mut impl MapSurface,
    ) -> MapLayers {
        let layers = MapLayers::from_snapshot(snapshot);
        surface.clear_markers();
        for layer in layers.iter() {
            surface.draw_layer(layer);
        }
        surface.show_popup(selection.popup().as_ref());
        layers
    }
}
