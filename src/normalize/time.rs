use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::FeedError;

// Zone-less patterns the backend emits for `timestamp without time zone`.
const FRACTIONAL_NAIVE: &str = "%Y-%m-%dT%H:%M:%S%.f";
const WHOLE_SECOND_NAIVE: &str = "%Y-%m-%dT%H:%M:%S";

// Parse a backend timestamp into UTC, trying RFC3339 (fractional seconds and
// offset) first, then the zone-less fractional pattern, then the zone-less
// whole-second pattern. Zone-less values are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, FRACTIONAL_NAIVE) {
        return Some(ndt.and_utc());
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, WHOLE_SECOND_NAIVE) {
        return Some(ndt.and_utc());
    }
    None
}

pub(crate) fn required(field: &'static str, raw: &str) -> Result<DateTime<Utc>, FeedError> {
    parse_timestamp(raw)
        .ok_or_else(|| FeedError::MalformedTimestamp { field, value: raw.to_string() })
}

pub(crate) fn optional(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, FeedError> {
    raw.map(|s| required(field, s)).transpose()
}
