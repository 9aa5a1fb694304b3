//! Concurrent fetch-and-merge for one poll cycle.

use forest_guard_feed::{HttpFeed, SourceFetcher, http::build_client};
use forest_guard_feed_models::{IotEvent, SatelliteAlert, SourceKind, UssdReport};

use crate::config::MonitorConfig;
use crate::snapshot::{CycleId, Snapshot, aggregate};

/// Reads all three feeds concurrently and combines the results.
#[derive(Clone)]
pub struct Aggregator {
    satellite: SourceFetcher<SatelliteAlert>,
    ussd: SourceFetcher<UssdReport>,
    iot: SourceFetcher<IotEvent>,
}

impl Aggregator {
    /// Creates an aggregator over the given fetchers.
    #[must_use]
    pub const fn new(
        satellite: SourceFetcher<SatelliteAlert>,
        ussd: SourceFetcher<UssdReport>,
        iot: SourceFetcher<IotEvent>,
    ) -> Self {
        Self {
            satellite,
            ussd,
            iot,
        }
    }

    /// Creates HTTP feeds for the configured provider endpoints, sharing one
    /// client.
    ///
    /// # Errors
    ///
    /// Returns [`forest_guard_feed::FeedError`] if the HTTP client cannot be
    /// built.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, forest_guard_feed::FeedError> {
        let client = build_client(config.request_timeout())?;
        let retry = config.retry_policy();
        let base = config.api_base_url.as_str();
        let endpoints = &config.endpoints;

        log::info!("Feeds: {base} (interval {}ms)", config.poll_interval_ms);

        Ok(Self::new(
            SourceFetcher::new(
                HttpFeed::new(
                    client.clone(),
                    SourceKind::Satellite,
                    base,
                    endpoints.path(SourceKind::Satellite),
                )
                .with_retry(retry),
            ),
            SourceFetcher::new(
                HttpFeed::new(
                    client.clone(),
                    SourceKind::Ussd,
                    base,
                    endpoints.path(SourceKind::Ussd),
                )
                .with_retry(retry),
            ),
            SourceFetcher::new(
                HttpFeed::new(client, SourceKind::Iot, base, endpoints.path(SourceKind::Iot))
                    .with_retry(retry),
            ),
        ))
    }

    /// Runs one cycle: fires the three reads at the same time and waits for
    /// all of them. Cannot fail, since every fetcher isolates its own errors.
    pub async fn collect(&self, cycle: CycleId) -> Snapshot {
        log::debug!("Cycle {cycle}: refreshing data streams...");
        let (satellite, ussd, iot) =
            tokio::join!(self.satellite.fetch(), self.ussd.fetch(), self.iot.fetch());
        let snapshot = aggregate(cycle, satellite, ussd, iot);
        log::debug!(
            "Cycle {cycle}: {} alerts, {} reports, {} sensor events",
            snapshot.satellite_alerts.len(),
            snapshot.ussd_reports.len(),
            snapshot.iot_events.len(),
        );
        snapshot
    }
}
