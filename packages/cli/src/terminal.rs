//! Text rendering of the map surface, stat cards and tables.

use forest_guard_monitor::boundary::RecoveryView;
use forest_guard_monitor::category::CategoryTable;
use forest_guard_monitor::config::Viewport;
use forest_guard_monitor::layers::{MapSurface, MarkerLayer};
use forest_guard_monitor::selection::{Popup, PopupLine};
use forest_guard_monitor::snapshot::Snapshot;

/// A [`MapSurface`] that describes what would be drawn as lines of text.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    lines: Vec<String>,
    verbose: bool,
}

impl TerminalSurface {
    /// Creates a surface. With `verbose`, every marker gets its own line.
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self {
            lines: Vec::new(),
            verbose,
        }
    }

    /// Appends a free-form line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Drains everything written since the last call.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl MapSurface for TerminalSurface {
    fn set_viewport(&mut self, viewport: &Viewport) {
        self.push(format!(
            "Map centered on {}, {} (zoom {}, pitch {}, bearing {})",
            viewport.latitude, viewport.longitude, viewport.zoom, viewport.pitch, viewport.bearing
        ));
    }

    fn clear_markers(&mut self) {}

    fn draw_layer(&mut self, layer: &MarkerLayer) {
        self.push(format!("  {:<10} {} markers", layer.kind.to_string(), layer.len()));
        if self.verbose {
            for marker in &layer.markers {
                self.push(format!("    {:<12} {}", marker.key, marker.position));
            }
        }
    }

    fn show_popup(&mut self, popup: Option<&Popup>) {
        let Some(popup) = popup else {
            return;
        };
        self.lines.extend(popup_lines(popup));
    }
}

/// Text lines for a popup.
#[must_use]
pub fn popup_lines(popup: &Popup) -> Vec<String> {
    let mut lines = vec![match popup.position {
        Some(position) => format!("[{}] at {position}", popup.title),
        None => format!("[{}]", popup.title),
    }];
    for line in &popup.lines {
        lines.push(match line {
            PopupLine::Field { label, value } => format!("  {label}: {value}"),
            PopupLine::Quote(text) => format!("  \"{text}\""),
        });
    }
    if let Some(proof) = &popup.verified_proof {
        lines.push(format!("  Blockchain Verified: {proof}"));
    }
    if let Some(target) = popup.escalation {
        lines.push(format!("  Escalate to governor ({target})"));
    }
    lines
}

/// Header with the cycle and one counter per feed, flagging feeds whose read
/// failed.
#[must_use]
pub fn stat_line(snapshot: &Snapshot) -> String {
    let mut line = format!(
        "Cycle {} at {}:",
        snapshot.cycle,
        snapshot.fetched_at.format("%H:%M:%S")
    );
    for card in snapshot.stat_cards() {
        let health = snapshot.health.get(card.kind);
        let flag = if health.stale {
            " (stale)"
        } else if health.status.is_ok() {
            ""
        } else {
            " (unavailable)"
        };
        line.push_str(&format!("  {} {}{flag}", card.label, card.count));
    }
    line
}

/// A table with padded columns.
#[must_use]
pub fn table_lines(table: &CategoryTable) -> Vec<String> {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = vec![
        format!("{} ({})", table.title, table.rows.len()),
        format_row(table.columns.iter().copied(), &widths),
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    ];
    for row in &table.rows {
        lines.push(format_row(row.iter().map(String::as_str), &widths));
    }
    lines
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

/// The recovery screen.
#[must_use]
pub fn recovery_lines(recovery: &RecoveryView) -> Vec<String> {
    vec![
        format!("!! {} !!", recovery.title),
        format!("   {}", recovery.detail),
        format!("   [{}]", recovery.action),
    ]
}
