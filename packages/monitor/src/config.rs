//! Monitor configuration.
//!
//! Settings are layered, later layers winning key by key:
//!
//! 1. Defaults embedded at compile time from `monitor.toml`.
//! 2. An optional user TOML file.
//! 3. `FOREST_GUARD_API_URL` / `FOREST_GUARD_POLL_INTERVAL_MS` environment
//!    variables.
//!
//! Command-line flags are applied on top by the binary.

use std::path::Path;
use std::time::Duration;

use forest_guard_feed::RetryPolicy;
use forest_guard_feed_models::SourceKind;
use serde::{Deserialize, Serialize};

/// Defaults baked into the binary.
const DEFAULT_TOML: &str = include_str!("../monitor.toml");

/// Environment variable overriding [`MonitorConfig::api_base_url`].
pub const ENV_API_URL: &str = "FOREST_GUARD_API_URL";

/// Environment variable overriding [`MonitorConfig::poll_interval_ms`].
pub const ENV_POLL_INTERVAL_MS: &str = "FOREST_GUARD_POLL_INTERVAL_MS";

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML or has wrongly typed keys.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// Endpoint paths, relative to [`MonitorConfig::api_base_url`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Satellite alert list.
    pub satellite: String,
    /// USSD report list.
    pub ussd: String,
    /// Acoustic sensor event list.
    pub iot: String,
}

impl EndpointConfig {
    /// Path for the given feed.
    #[must_use]
    pub fn path(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Satellite => &self.satellite,
            SourceKind::Iot => &self.iot,
            SourceKind::Ussd => &self.ussd,
        }
    }
}

/// Initial camera state handed to the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Zoom level.
    pub zoom: f64,
    /// Camera pitch in degrees.
    pub pitch: f64,
    /// Camera bearing in degrees.
    pub bearing: f64,
    /// Upper bound the surface should allow for pitch.
    pub max_pitch: f64,
}

/// Where escalation messages are addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Recipient mailbox.
    pub recipient: String,
}

/// Full monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Base URL of the data provider API.
    pub api_base_url: String,
    /// Time between poll cycles.
    pub poll_interval_ms: u64,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
    /// Retries for transient HTTP failures within one cycle.
    pub max_retries: u32,
    /// Keep a failed source's previous records (flagged stale) instead of
    /// blanking them.
    pub retain_last_known_good: bool,
    /// Endpoint paths.
    pub endpoints: EndpointConfig,
    /// Initial camera state.
    pub viewport: Viewport,
    /// Escalation addressing.
    pub escalation: EscalationConfig,
}

impl MonitorConfig {
    /// Loads the defaults, merges `path` over them when given, applies
    /// environment overrides, and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or the
    /// merged values are invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let overlay = match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Some(std::fs::read_to_string(path)?)
            }
            None => None,
        };
        let mut config = Self::from_toml_layers(overlay.as_deref())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses the embedded defaults with `overlay` merged on top.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if either layer is malformed.
    pub fn from_toml_layers(overlay: Option<&str>) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(DEFAULT_TOML)?;
        if let Some(overlay) = overlay {
            let overlay: toml::Table = toml::from_str(overlay)?;
            merge_tables(&mut table, overlay);
        }
        Ok(toml::Value::Table(table).try_into()?)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                message: format!("{ENV_POLL_INTERVAL_MS} must be an integer, got {raw:?}"),
            })?;
        }
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "api_base_url must not be empty".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "request_timeout_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Retry policy for feed requests.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }
}

impl Default for MonitorConfig {
    /// The embedded defaults, without environment overrides.
    fn default() -> Self {
        // The embedded file is covered by `embedded_defaults_parse`.
        Self::from_toml_layers(None).unwrap_or_else(|e| panic!("Invalid monitor.toml: {e}"))
    }
}

/// Recursively merges `overlay` into `base`; nested tables merge key by key,
/// anything else is replaced.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let incoming = match value {
            toml::Value::Table(incoming) => incoming,
            other => {
                base.insert(key, other);
                continue;
            }
        };
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key, toml::Value::Table(incoming));
    }
}
