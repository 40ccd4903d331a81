//! Tracker timestamp parsing and the numeric date encodings used by rows.
//!
//! Rows carry each date three ways so that analytics sinks can bucket by
//! day, sort by second, or join on epoch time without reparsing:
//!
//! - `day`: `YYYYMMDD`
//! - `date_time`: `YYYYMMDDHHMMSS`
//! - `timestamp`: epoch seconds, truncated
//!
//! Day and day+time are rendered in the timestamp's own UTC offset, which is
//! the offset the tracker reported.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Formats accepted besides RFC 3339, tried in order.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a tracker timestamp.
///
/// Accepts RFC 3339, the tracker's `2009-02-12T17:40:27.000-0600` form, and
/// naive date-times which are read as UTC.
///
/// # Errors
///
/// Returns [`TimelineError::MalformedDate`] naming `field` when no format
/// matches.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<FixedOffset>, TimelineError> {
    let trimmed = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    Err(TimelineError::MalformedDate {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// Whole seconds from `before` to `after`, truncated toward zero.
#[must_use]
pub fn seconds_between(before: &DateTime<FixedOffset>, after: &DateTime<FixedOffset>) -> i64 {
    (*after - *before).num_seconds()
}

/// `YYYYMMDD` for a timestamp in its own offset.
#[must_use]
pub fn day_number(ts: &DateTime<FixedOffset>) -> i64 {
    i64::from(ts.year()) * 10_000 + i64::from(ts.month()) * 100 + i64::from(ts.day())
}

/// `YYYYMMDDHHMMSS` for a timestamp in its own offset.
#[must_use]
pub fn day_time_number(ts: &DateTime<FixedOffset>) -> i64 {
    day_number(ts) * 1_000_000
        + i64::from(ts.hour()) * 10_000
        + i64::from(ts.minute()) * 100
        + i64::from(ts.second())
}

/// A date in every encoding a row carries.
///
/// The zero value (empty string, zeros) stands for "no date".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateEncodings {
    /// `YYYY-MM-DD`, or empty when unset.
    pub date: String,
    pub day: i64,
    pub date_time: i64,
    pub timestamp: i64,
}

impl DateEncodings {
    #[must_use]
    pub fn from_timestamp(ts: &DateTime<FixedOffset>) -> Self {
        Self {
            date: ts.format("%Y-%m-%d").to_string(),
            day: day_number(ts),
            date_time: day_time_number(ts),
            timestamp: ts.timestamp(),
        }
    }

    /// Parse a raw date string; empty input yields the zero sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::MalformedDate`] for non-empty input that is
    /// not a recognised timestamp.
    pub fn parse(field: &str, raw: &str) -> Result<Self, TimelineError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        parse_timestamp(field, raw).map(|ts| Self::from_timestamp(&ts))
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.timestamp != 0 || !self.date.is_empty()
    }
}
