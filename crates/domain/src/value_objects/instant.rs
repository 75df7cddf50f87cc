//! Point-in-time value object
//!
//! Timestamps are kept at millisecond precision so that the ISO-8601 form
//! round-trips exactly.
//!
//! # Examples
//!
//! ```
//! use domain::Instant;
//!
//! let earlier = Instant::parse("2024-03-01T10:00:00.000Z").unwrap();
//! let later = Instant::parse("2024-03-01T10:00:00.250Z").unwrap();
//!
//! assert!(earlier.is_before(&later));
//! assert_eq!(later.to_iso8601(), "2024-03-01T10:00:00.250Z");
//! ```

use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Millisecond digits kept after truncation
const PRECISION_DIGITS: u16 = 3;

/// An immutable UTC point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instant(DateTime<Utc>);

impl Instant {
    /// The current time
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Wrap a chrono timestamp, truncating to millisecond precision
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime.trunc_subsecs(PRECISION_DIGITS))
    }

    /// Build from milliseconds since the Unix epoch
    ///
    /// Fails when the value is outside chrono's representable range.
    pub fn from_timestamp_millis(millis: i64) -> Result<Self, DomainError> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidTimestamp(format!("{millis} ms is out of range")))
    }

    /// Parse an ISO-8601 / RFC-3339 timestamp
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
            .map_err(|e| DomainError::InvalidTimestamp(format!("'{value}': {e}")))
    }

    /// Get a copy of the underlying timestamp
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Whether this instant lies strictly before `other`
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Whether this instant lies strictly after `other`
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// ISO-8601 representation with millisecond precision and a `Z` suffix
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Instant {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(datetime)
    }
}

impl From<Instant> for DateTime<Utc> {
    fn from(instant: Instant) -> Self {
        instant.0
    }
}

impl TryFrom<String> for Instant {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Instant> for String {
    fn from(instant: Instant) -> Self {
        instant.to_iso8601()
    }
}
