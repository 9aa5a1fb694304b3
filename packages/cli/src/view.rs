//! Per-snapshot view state of the terminal front-end.

use forest_guard_feed_models::SourceKind;
use forest_guard_monitor::category::CategoryViewController;
use forest_guard_monitor::config::Viewport;
use forest_guard_monitor::escalation::Escalation;
use forest_guard_monitor::layers::{MapLayerRenderer, MapSurface};
use forest_guard_monitor::selection::SelectionController;
use forest_guard_monitor::snapshot::Snapshot;

use crate::terminal::{TerminalSurface, stat_line, table_lines};

/// What the operator asked to see.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// Initial camera.
    pub viewport: Viewport,
    /// Category table to print with every snapshot.
    pub category: Option<SourceKind>,
    /// Marker key to select once it shows up on the map.
    pub select: Option<String>,
    /// Escalate the selected alert right after selecting it.
    pub escalate: bool,
    /// One line per marker.
    pub verbose: bool,
}

/// Selection, category and surface state carried across snapshots.
#[derive(Debug)]
pub struct ViewState {
    renderer: MapLayerRenderer,
    surface: TerminalSurface,
    selection: SelectionController,
    category: CategoryViewController,
    pending_select: Option<String>,
    escalate: bool,
}

impl ViewState {
    /// Builds a fresh view and mounts the map.
    #[must_use]
    pub fn new(options: &ViewOptions) -> Self {
        let renderer = MapLayerRenderer::new(options.viewport);
        let mut surface = TerminalSurface::new(options.verbose);
        renderer.mount(&mut surface);

        let mut category = CategoryViewController::default();
        if let Some(kind) = options.category {
            category.open(kind);
        }

        Self {
            renderer,
            surface,
            selection: SelectionController::default(),
            category,
            pending_select: options.select.clone(),
            escalate: options.escalate,
        }
    }

    /// Renders `snapshot` and returns the lines to print.
    pub fn show(&mut self, snapshot: &Snapshot, escalation: &Escalation) -> Vec<String> {
        self.surface.push(stat_line(snapshot));
        let layers = self
            .renderer
            .render(snapshot, &self.selection, &mut self.surface);

        if let Some(key) = self.pending_select.take() {
            if let Some(marker) = layers.marker(&key) {
                self.selection.handle_click(Some(marker));
                self.surface.show_popup(self.selection.popup().as_ref());
                if self.escalate {
                    match self.selection.escalate(escalation) {
                        Ok(()) => self.surface.push("  Escalation sent"),
                        Err(e) => log::warn!("{e}"),
                    }
                }
            } else {
                log::warn!("Marker {key} is not on the map in cycle {}", snapshot.cycle);
                self.pending_select = Some(key);
            }
        }

        if let Some(table) = self.category.table(snapshot) {
            for line in table_lines(&table) {
                self.surface.push(line);
            }
        }

        self.surface.take_output()
    }
}
