//! HTTP JSON transport for feed providers.
//!
//! All HTTP feed reads go through [`send_json`], which decodes the body into
//! the requested type and retries transient failures (connection errors,
//! timeouts, HTTP 429, HTTP 5xx) according to a [`RetryPolicy`].
//!
//! Feeds are polled every few seconds, so the retry budget is kept small:
//! a cycle that keeps failing is better abandoned and picked up again by
//! the next tick than stretched across several intervals.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use forest_guard_feed_models::SourceKind;
use serde::de::DeserializeOwned;

use crate::{FeedError, FeedSource};

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// How many times a transient failure is retried and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(250),
        }
    }
}

/// Builds the shared HTTP client used by every feed.
///
/// `timeout` bounds each request end to end, so a hung provider cannot
/// stall a poll cycle forever.
///
/// # Errors
///
/// Returns [`FeedError::Http`] if the TLS backend fails to initialise.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, FeedError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Sends an HTTP request and decodes the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// Does **not** retry HTTP 4xx (except 429) or undecodable bodies; those
/// are permanent for the current cycle.
///
/// # Errors
///
/// Returns [`FeedError`] if the request fails after all retries, the server
/// answers with a non-success status, or the body cannot be decoded.
#[allow(clippy::future_not_send)]
pub async fn send_json<T, F>(build_request: F, policy: &RetryPolicy) -> Result<T, FeedError>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        match send_once(build_request()).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                log::warn!(
                    "  transient error: {e} (retry {attempt}/{} in {delay:?})",
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn send_once<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, FeedError> {
    let response = request.send().await?;

    let url = response.url().to_string();
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status {
            url,
            status: status.as_u16(),
        });
    }

    // Read as text first so a decode failure can log what actually arrived.
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        let preview = if text.len() > BODY_PREVIEW_LEN {
            let mut end = BODY_PREVIEW_LEN;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &text[..end])
        } else {
            text.clone()
        };
        log::debug!(
            "JSON decode failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {preview}",
            text.len(),
        );
        FeedError::Decode {
            url: url.clone(),
            message: e.to_string(),
        }
    })
}

/// A feed served as a JSON array at `GET <base_url><path>`.
pub struct HttpFeed<R> {
    kind: SourceKind,
    url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
    _record: PhantomData<fn() -> R>,
}

impl<R> HttpFeed<R> {
    /// Creates a feed reading `base_url` joined with `path`.
    #[must_use]
    pub fn new(client: reqwest::Client, kind: SourceKind, base_url: &str, path: &str) -> Self {
        let url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Self {
            kind,
            url,
            client,
            retry: RetryPolicy::default(),
            _record: PhantomData,
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The full URL this feed reads.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<R> FeedSource<R> for HttpFeed<R>
where
    R: DeserializeOwned + Send + 'static,
{
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self) -> Result<Vec<R>, FeedError> {
        send_json(|| self.client.get(&self.url), &self.retry).await
    }
}

#[cfg(test)]
mod tests {
    use forest_guard_feed_models::{SatelliteAlert, UssdReport};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn joins_base_url_and_path() {
        let feed: HttpFeed<UssdReport> = HttpFeed::new(
            reqwest::Client::new(),
            SourceKind::Ussd,
            "http://localhost:8000/",
            "/ussd",
        );
        assert_eq!(feed.url(), "http://localhost:8000/ussd");
    }

    #[tokio::test]
    async fn decodes_record_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/satellite-alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "lat": 0, "lon": 34.9, "alert_date": "2024-05-01", "confidence_level": "high"},
                {"id": 2, "lat": null, "lon": null, "confidence_level": "nominal"}
            ])))
            .mount(&server)
            .await;

        let feed: HttpFeed<SatelliteAlert> = HttpFeed::new(
            reqwest::Client::new(),
            SourceKind::Satellite,
            &server.uri(),
            "/satellite-alerts",
        );
        let alerts = feed.fetch().await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].confidence_level, "high");
        assert!(alerts[1].lat.is_none());
    }

    #[tokio::test]
    async fn null_text_fields_keep_the_whole_report_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ussd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "lat": 0.3, "lon": 34.8, "phone_number": "+254700000001", "report_details": "Logging", "location_text": "Isecheno"},
                {"id": 2, "lat": 0.2, "lon": 34.9, "phone_number": "+254700000002", "report_details": "Charcoal kilns", "location_text": null, "received_at": null}
            ])))
            .mount(&server)
            .await;

        let feed: HttpFeed<UssdReport> = HttpFeed::new(
            reqwest::Client::new(),
            SourceKind::Ussd,
            &server.uri(),
            "/ussd",
        );
        let reports = feed.fetch().await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].location_text, "");
        assert_eq!(reports[1].report_details, "Charcoal kilns");
    }

    #[tokio::test]
    async fn retries_server_errors_then_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ussd"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let feed: HttpFeed<UssdReport> = HttpFeed::new(
            reqwest::Client::new(),
            SourceKind::Ussd,
            &server.uri(),
            "/ussd",
        )
        .with_retry(fast_retry(2));

        let err = feed.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ussd"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let feed: HttpFeed<UssdReport> = HttpFeed::new(
            reqwest::Client::new(),
            SourceKind::Ussd,
            &server.uri(),
            "/ussd",
        )
        .with_retry(fast_retry(2));

        let err = feed.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn reports_undecodable_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ussd"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"detail\": \"oops\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let feed: HttpFeed<UssdReport> = HttpFeed::new(
            reqwest::Client::new(),
            SourceKind::Ussd,
            &server.uri(),
            "/ussd",
        )
        .with_retry(fast_retry(2));

        let err = feed.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Decode { .. }));
    }
}
