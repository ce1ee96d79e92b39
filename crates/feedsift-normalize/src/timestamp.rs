//! Timestamp parsing for heterogeneous feed formats.
//!
//! Sources emit anything from RFC 3339 to bare `YYYY-MM-DD HH:MM:SS`
//! tokens, and one vendor prefixes its own name to the timestamp. A string
//! that matches nothing yields `None` -- never an error -- and the record is
//! excluded from recency filtering downstream.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Vendor tags observed preceding an embedded `YYYY-MM-DD HH:MM:SS` token.
const VENDOR_TAGS: &[&str] = &["TrendForce"];

/// Naive formats (no zone information) assumed to be UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Parse a source timestamp string into UTC.
///
/// Accepts RFC 3339 / ISO-8601 variants, RFC 2822 mail dates, a small set
/// of zoneless formats (interpreted as UTC), and vendor-tagged timestamps
/// (the tag is stripped and the remainder parsed). Returns `None` when no
/// format matches.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for tag in VENDOR_TAGS {
        if let Some((_, rest)) = s.split_once(tag) {
            let rest = rest.trim();
            if let Ok(naive) = NaiveDateTime::parse_from_str(rest, "%Y-%m-%d %H:%M:%S") {
                return Some(naive.and_utc());
            }
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    None
}
