//! Identity and timestamp types shared by every document kind.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// System-assigned document identity
///
/// A DocId wraps a UUID v4. It serializes as the hyphenated UUID string and
/// is the `id` field of every document the API returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(Uuid);

impl DocId {
    /// Create a new random DocId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identity supplied by a client.
    ///
    /// # Errors
    /// Returns `MalformedIdentity` if the string is not a UUID.
    pub fn parse(entity: &'static str, s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::MalformedIdentity {
                entity,
                id: s.to_string(),
            })
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a client-supplied measurement time.
///
/// Accepts RFC 3339 date-times (`2024-05-01T08:30:00.000Z`), bare dates
/// (`2024-05-01`, midnight UTC) and integer milliseconds since the epoch.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    if let Ok(millis) = s.parse::<i64>() {
        if let Some(ts) = DateTime::from_timestamp_millis(millis) {
            return Ok(ts);
        }
    }
    Err(Error::validation(format!("{} is not a valid timestamp", s)))
}
