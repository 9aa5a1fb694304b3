//! Timestamp helpers for provider date strings.
//!
//! Providers send dates as free-form strings. They are kept verbatim on the
//! records and only parsed when rendered.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Placeholder shown for a missing date.
pub const NOT_AVAILABLE: &str = "N/A";

/// Parses an RFC 3339 timestamp or a naive ISO 8601 datetime (with or
/// without fractional seconds, `T` or space separated). Naive values are
/// taken as UTC.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Formats a provider timestamp as a time of day (`HH:MM:SS`).
///
/// Unparseable values are returned verbatim; missing values become
/// [`NOT_AVAILABLE`].
#[must_use]
pub fn display_time(value: Option<&str>) -> String {
    value.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |raw| {
            parse_timestamp(raw)
                .map_or_else(|| raw.to_string(), |dt| dt.format("%H:%M:%S").to_string())
        },
    )
}

/// Formats a provider timestamp as date and time (`YYYY-MM-DD HH:MM:SS`).
#[must_use]
pub fn display_date_time(value: Option<&str>) -> String {
    value.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |raw| {
            parse_timestamp(raw).map_or_else(
                || raw.to_string(),
                |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            )
        },
    )
}

/// Formats a provider date verbatim, or [`NOT_AVAILABLE`] when missing or
/// blank.
#[must_use]
pub fn display_date(value: Option<&str>) -> String {
    match value {
        Some(raw) if !raw.trim().is_empty() => raw.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_timestamp("2024-03-01T09:15:00+03:00").unwrap();
        assert_eq!(dt.to_string(), "2024-03-01 06:15:00 UTC");
    }

    #[test]
    fn parses_naive_with_fractional() {
        let dt = parse_timestamp("2024-03-01T09:15:00.123").unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "09:15:00");
    }

    #[test]
    fn parses_space_separated() {
        assert!(parse_timestamp("2024-03-01 09:15:00").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn displays_missing_values_as_na() {
        assert_eq!(display_time(None), NOT_AVAILABLE);
        assert_eq!(display_date_time(None), NOT_AVAILABLE);
        assert_eq!(display_date(Some("  ")), NOT_AVAILABLE);
    }

    #[test]
    fn displays_unparseable_values_verbatim() {
        assert_eq!(display_time(Some("around noon")), "around noon");
    }

    #[test]
    fn displays_parsed_values() {
        assert_eq!(display_time(Some("2024-03-01T09:15:07Z")), "09:15:07");
        assert_eq!(
            display_date_time(Some("2024-03-01T09:15:07Z")),
            "2024-03-01 09:15:07"
        );
    }
}
