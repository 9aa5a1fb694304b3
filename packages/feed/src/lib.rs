#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feed source trait and failure isolation for the three threat feeds.
//!
//! Each provider implements the [`FeedSource`] trait. Callers never talk to
//! a [`FeedSource`] directly; they go through a [`SourceFetcher`], which logs
//! any failure and degrades it to an empty sequence so that one broken feed
//! can never take the other two down with it.

pub mod fetcher;
pub mod http;

use async_trait::async_trait;
use forest_guard_feed_models::SourceKind;

pub use fetcher::{FeedOutcome, FeedStatus, SourceFetcher};
pub use http::{HttpFeed, RetryPolicy};

/// Errors that can occur while reading a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The response body was not a decodable record array.
    #[error("Failed to decode response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder error text.
        message: String,
    },
}

impl FeedError {
    /// Returns `true` if the error is likely transient and worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_body() || e.is_request(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. } => false,
        }
    }
}

/// Trait that every feed provider implements.
///
/// An implementation performs one read against its provider per call and
/// returns the records in provider response order.
#[async_trait]
pub trait FeedSource<R>: Send + Sync {
    /// Which feed this source serves.
    fn kind(&self) -> SourceKind;

    /// Reads the current record list from the provider.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request fails or the body cannot be
    /// decoded.
    async fn fetch(&self) -> Result<Vec<R>, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_rate_limits_are_transient() {
        let status = |status| FeedError::Status {
            url: "http://localhost:8000/ussd".to_string(),
            status,
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(
            !FeedError::Decode {
                url: String::new(),
                message: "expected array".to_string(),
            }
            .is_transient()
        );
    }
}
