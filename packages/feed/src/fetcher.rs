//! Per-source failure isolation.
//!
//! A [`SourceFetcher`] performs one read against its feed and never fails:
//! any [`crate::FeedError`] is logged and turned into an empty record list.
//! The [`FeedStatus`] that travels alongside the records is the only place
//! where "the feed is empty" and "the feed is down" can be told apart.

use std::sync::Arc;

use forest_guard_feed_models::SourceKind;
use serde::Serialize;

use crate::FeedSource;

/// Result of the most recent read of one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FeedStatus {
    /// The provider answered with a decodable record list.
    Ok,
    /// The read failed; the records are empty.
    Failed {
        /// Error text, for diagnostics only.
        message: String,
    },
}

impl FeedStatus {
    /// Whether the read succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Records from one read plus how that read went.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOutcome<R> {
    /// Records in provider response order. Empty when the read failed.
    pub records: Vec<R>,
    /// Whether the read succeeded.
    pub status: FeedStatus,
}

impl<R> FeedOutcome<R> {
    /// A successful read.
    #[must_use]
    pub const fn ok(records: Vec<R>) -> Self {
        Self {
            records,
            status: FeedStatus::Ok,
        }
    }

    /// A failed read, carrying no records.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            status: FeedStatus::Failed {
                message: message.into(),
            },
        }
    }
}

/// Wraps a [`FeedSource`] so that reads never fail.
pub struct SourceFetcher<R> {
    source: Arc<dyn FeedSource<R>>,
}

impl<R> Clone for SourceFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<R: Send + 'static> SourceFetcher<R> {
    /// Wraps `source`.
    #[must_use]
    pub fn new(source: impl FeedSource<R> + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Which feed this fetcher reads.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Reads the feed once. Never fails: errors are logged and surface as an
    /// empty record list with a [`FeedStatus::Failed`] status.
    pub async fn fetch(&self) -> FeedOutcome<R> {
        let kind = self.source.kind();
        match self.source.fetch().await {
            Ok(records) => {
                log::debug!("{kind}: fetched {} records", records.len());
                FeedOutcome::ok(records)
            }
            Err(e) => {
                log::error!("Error fetching {kind} feed: {e}");
                FeedOutcome::failed(e.to_string())
            }
        }
    }
}
