// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! Stored timestamps use a fixed-width `YYYY-MM-DDTHH:MM:SSZ` form, so string
//! comparison in Firestore filters matches chronological order.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time in storage format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Parse a stored or client-supplied timestamp.
///
/// Accepts full RFC3339 as well as bare `YYYY-MM-DD` dates (midnight UTC),
/// which is what date pickers send.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Whole days elapsed between `from` and `now`, never negative.
pub fn days_since(from: &str, now: DateTime<Utc>) -> i64 {
    parse_timestamp(from)
        .map(|dt| (now - dt).num_days().max(0))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_is_fixed_width() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_utc_rfc3339(dt), "2026-03-04T05:06:07Z");
    }

    #[test]
    fn test_parse_accepts_dates_and_offsets() {
        let midnight = parse_timestamp("2026-01-15").unwrap();
        assert_eq!(format_utc_rfc3339(midnight), "2026-01-15T00:00:00Z");

        let shifted = parse_timestamp("2026-01-15T10:00:00+02:00").unwrap();
        assert_eq!(format_utc_rfc3339(shifted), "2026-01-15T08:00:00Z");

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_days_since() {
        let now = Utc.with_ymd_and_hms(2026, 1, 11, 12, 0, 0).unwrap();
        assert_eq!(days_since("2026-01-01T12:00:00Z", now), 10);
        assert_eq!(days_since("2026-02-01T00:00:00Z", now), 0);
        assert_eq!(days_since("garbage", now), 0);
    }
}
