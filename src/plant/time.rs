//! Timestamp normalization.
//!
//! The estimator works on timezone-naive instants. Offsets present in the
//! source are applied (converted to UTC) and then dropped; timestamps with no
//! offset are already UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];

/// Parses a timestamp, converts it to UTC and strips the timezone.
///
/// Returns `None` if the value matches none of the accepted layouts.
///
/// # Examples
///
/// ```
/// use windfarm_aep::plant::time::parse_utc_naive;
///
/// let t = parse_utc_naive("2014-01-01T01:00:00+01:00").unwrap();
/// assert_eq!(t.to_string(), "2014-01-01 00:00:00");
/// ```
pub fn parse_utc_naive(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
