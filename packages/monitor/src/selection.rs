//! Single active marker selection and its popup.
//!
//! At most one record is selected at a time, across all layers. The
//! selection is independent of polling: it keeps pointing at the record it
//! was given even after that record disappears from a newer snapshot, until
//! it is dismissed or replaced.

use forest_guard_feed_models::{Coordinates, FeedRecord, Locatable, SourceKind};

use crate::escalation::{Escalation, NotifyError};
use crate::layers::Marker;

/// Characters of a provenance proof shown in the popup badge.
const PROOF_PREVIEW_CHARS: usize = 20;

/// The currently inspected record.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    record: FeedRecord,
}

impl Selection {
    /// The selected record.
    #[must_use]
    pub const fn record(&self) -> &FeedRecord {
        &self.record
    }

    /// Feed the record came from.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        self.record.kind()
    }
}

/// Selection state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionState {
    /// Nothing selected.
    #[default]
    Idle,
    /// A record is selected.
    Active(Selection),
}

/// Input events from the map surface.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// A marker was clicked. Consumed by the selection; never reaches the
    /// backdrop.
    MarkerClicked(FeedRecord),
    /// The map outside any marker was clicked.
    BackdropClicked,
    /// The popup's close button was clicked.
    PopupClosed,
}

/// One line of popup body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupLine {
    /// A labelled value.
    Field {
        /// Label.
        label: &'static str,
        /// Value.
        value: String,
    },
    /// Quoted free text.
    Quote(String),
}

/// Popup content for the selected record.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    /// Feed of the selected record.
    pub kind: SourceKind,
    /// Header label.
    pub title: &'static str,
    /// Where the popup points. `None` when the record has no position.
    pub position: Option<Coordinates>,
    /// Body lines.
    pub lines: Vec<PopupLine>,
    /// Shortened provenance proof, for verified citizen reports.
    pub verified_proof: Option<String>,
    /// Coordinates handed to the escalate action, for satellite alerts.
    pub escalation: Option<Coordinates>,
}

impl Popup {
    /// Builds popup content for `record`.
    #[must_use]
    pub fn for_record(record: &FeedRecord) -> Self {
        let kind = record.kind();
        let position = record.coordinates();
        let mut lines = Vec::new();
        let mut verified_proof = None;
        let mut escalation = None;

        match record {
            FeedRecord::Satellite(alert) => {
                if !alert.confidence_level.is_empty() {
                    lines.push(PopupLine::Field {
                        label: "Confidence",
                        value: alert.confidence_level.clone(),
                    });
                }
                escalation = position;
            }
            FeedRecord::Ussd(report) => {
                if !report.report_details.is_empty() {
                    lines.push(PopupLine::Quote(report.report_details.clone()));
                }
                verified_proof = report.blockchain_proof.as_deref().map(shorten_proof);
            }
            FeedRecord::Iot(event) => {
                if !event.sound_type.is_empty() {
                    lines.push(PopupLine::Field {
                        label: "Sound",
                        value: event.sound_type.to_uppercase(),
                    });
                }
            }
        }

        Self {
            kind,
            title: kind.popup_label(),
            position,
            lines,
            verified_proof,
            escalation,
        }
    }
}

fn shorten_proof(proof: &str) -> String {
    let preview: String = proof.chars().take(PROOF_PREVIEW_CHARS).collect();
    format!("{preview}...")
}

/// Tracks at most one selected record across all layers.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    /// Selects `record`, replacing any previous selection.
    pub fn select(&mut self, record: FeedRecord) {
        log::debug!("Selected {}", record.marker_key());
        self.state = SelectionState::Active(Selection { record });
    }

    /// Clears the selection.
    pub fn dismiss(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// The current selection, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Selection> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Active(selection) => Some(selection),
        }
    }

    /// The raw state.
    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Applies one map event.
    pub fn handle(&mut self, event: MapEvent) {
        match event {
            MapEvent::MarkerClicked(record) => self.select(record),
            MapEvent::BackdropClicked | MapEvent::PopupClosed => self.dismiss(),
        }
    }

    /// Resolves a click at some point of the map. A hit marker takes the
    /// click and stops it there; only a click that hits no marker reaches
    /// the backdrop and dismisses the selection.
    pub fn handle_click(&mut self, hit: Option<&Marker>) {
        let event = hit.map_or(MapEvent::BackdropClicked, Marker::click);
        self.handle(event);
    }

    /// Popup content for the current selection.
    #[must_use]
    pub fn popup(&self) -> Option<Popup> {
        self.current()
            .map(|selection| Popup::for_record(selection.record()))
    }

    /// Coordinates for the escalate action. Only available while a
    /// satellite alert with a position is selected.
    #[must_use]
    pub fn escalation_target(&self) -> Option<Coordinates> {
        match self.current()?.record() {
            FeedRecord::Satellite(alert) => alert.coordinates(),
            FeedRecord::Iot(_) | FeedRecord::Ussd(_) => None,
        }
    }

    /// Runs the escalate action for the selected satellite alert.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotAvailable`] if no satellite alert with a
    /// position is selected, or the notifier's error if dispatch fails.
    pub fn escalate(&self, escalation: &Escalation) -> Result<(), NotifyError> {
        let target = self.escalation_target().ok_or(NotifyError::NotAvailable)?;
        escalation.send(target)
    }
}
