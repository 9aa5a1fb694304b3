#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front-end for the forest threat monitor.
//!
//! Polls the satellite, USSD and acoustic sensor feeds and prints what the
//! map would show after every cycle: per-feed counters, marker layers, the
//! popup of a selected marker and, optionally, one category table.

mod terminal;
mod view;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use forest_guard_feed_models::SourceKind;
use forest_guard_monitor::boundary::Boundary;
use forest_guard_monitor::escalation::{Escalation, LogNotifier};
use forest_guard_monitor::{Monitor, MonitorConfig, Snapshot};

use crate::terminal::recovery_lines;
use crate::view::{ViewOptions, ViewState};

#[derive(Parser)]
#[command(name = "forest_guard", about = "Forest threat situational-awareness monitor")]
struct Cli {
    /// TOML file overriding the built-in configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the feed API (overrides `FOREST_GUARD_API_URL`)
    #[arg(long)]
    api_url: Option<String>,
    /// Poll interval in milliseconds (overrides `FOREST_GUARD_POLL_INTERVAL_MS`)
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Run a single cycle, print it and exit
    #[arg(long)]
    once: bool,
    /// Exit after this many snapshots
    #[arg(long)]
    cycles: Option<u64>,
    /// Print the table for this feed (`satellite`, `iot` or `ussd`)
    #[arg(long, value_parser = parse_kind)]
    category: Option<SourceKind>,
    /// Select a marker and print its popup, e.g. `satellite:12`
    #[arg(long, value_parser = parse_marker_key)]
    select: Option<String>,
    /// Escalate the selected satellite alert
    #[arg(long, requires = "select")]
    escalate: bool,
    /// List every marker instead of per-layer counts
    #[arg(long, short)]
    verbose: bool,
    /// Print each snapshot as JSON instead of the text view
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut MonitorConfig) {
        if let Some(url) = &self.api_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poll_interval_ms = interval_ms;
        }
    }

    fn view_options(&self, config: &MonitorConfig) -> ViewOptions {
        ViewOptions {
            viewport: config.viewport,
            category: self.category,
            select: self.select.clone(),
            escalate: self.escalate,
            verbose: self.verbose,
        }
    }
}

fn parse_kind(value: &str) -> Result<SourceKind, String> {
    value
        .parse()
        .map_err(|_| format!("unknown feed {value:?} (expected satellite, iot or ussd)"))
}

/// Turns `kind:id` into the marker key used on the map.
fn parse_marker_key(value: &str) -> Result<String, String> {
    let (kind, id) = value
        .split_once(':')
        .ok_or_else(|| format!("expected <kind>:<id>, got {value:?}"))?;
    let kind = parse_kind(kind)?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing record id in {value:?}"));
    }
    Ok(format!("{}-{id}", kind.marker_prefix()))
}

fn present(
    json: bool,
    view: &mut Boundary<ViewState>,
    snapshot: &Snapshot,
    escalation: &Escalation,
) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }

    match view.render(|state| state.show(snapshot, escalation)) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        Err(recovery) => {
            for line in recovery_lines(&recovery) {
                println!("{line}");
            }
            view.reload();
        }
    }
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut config = MonitorConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let escalation = Escalation::new(config.escalation.recipient.clone(), Arc::new(LogNotifier));
    let options = cli.view_options(&config);
    let mut view = Boundary::new(move || ViewState::new(&options));
    let mut monitor = Monitor::from_config(&config)?;

    if cli.once {
        monitor.refresh().await;
        present(cli.json, &mut view, &monitor.current(), &escalation)?;
        return Ok(());
    }

    let mut updates = monitor.subscribe();
    monitor.start();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut shown = 0_u64;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = Arc::clone(&updates.borrow_and_update());
                present(cli.json, &mut view, &snapshot, &escalation)?;
                shown += 1;
                if cli.cycles.is_some_and(|limit| shown >= limit) {
                    break;
                }
            }
            _ = &mut shutdown => {
                log::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    monitor.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_keys_use_the_layer_prefix() {
        assert_eq!(parse_marker_key("satellite:12").unwrap(), "sat-12");
        assert_eq!(parse_marker_key("ussd:abc").unwrap(), "ussd-abc");
        assert_eq!(parse_marker_key("iot: 4").unwrap(), "iot-4");
    }

    #[test]
    fn malformed_marker_targets_are_rejected() {
        assert!(parse_marker_key("satellite").is_err());
        assert!(parse_marker_key("drone:1").is_err());
        assert!(parse_marker_key("iot:").is_err());
    }

    #[test]
    fn flags_override_the_config() {
        let cli = Cli::try_parse_from([
            "forest_guard",
            "--api-url",
            "http://feeds.local:9000",
            "--interval-ms",
            "2000",
            "--category",
            "ussd",
        ])
        .unwrap();
        let mut config = MonitorConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.api_base_url, "http://feeds.local:9000");
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(cli.view_options(&config).category, Some(SourceKind::Ussd));
    }

    #[test]
    fn escalate_requires_a_selection() {
        assert!(Cli::try_parse_from(["forest_guard", "--escalate"]).is_err());
        assert!(Cli::try_parse_from(["forest_guard", "--select", "satellite:1", "--escalate"]).is_ok());
    }
}
