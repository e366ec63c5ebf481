//! Wall-clock timestamps used on evidence records and cache entries.
//!
//! The upstream `decision-gate-core` crate deliberately keeps wall-clock
//! reads out of its core to stay replay-deterministic. That constraint does
//! not apply here: cache TTL and `observed_at` staleness checks are part of
//! this system's actual contract, so a real timestamp is required. `time`
//! is already a workspace dependency pulled in for this reason.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A wall-clock instant, serialized as an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Captures the current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an existing instant.
    #[must_use]
    pub fn from_offset_date_time(dt: OffsetDateTime) -> Self {
        Self(dt)
    }

    /// Returns the wrapped instant.
    #[must_use]
    pub fn as_offset_date_time(self) -> OffsetDateTime {
        self.0
    }

    /// Returns whether this timestamp is older than `max_age_seconds`
    /// relative to `now`.
    #[must_use]
    pub fn is_older_than(self, max_age_seconds: i64, now: Self) -> bool {
        (now.0 - self.0).whole_seconds() > max_age_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn staleness_boundary() {
        let then = Timestamp::now();
        let still_fresh = Timestamp::from_offset_date_time(then.as_offset_date_time() + Duration::hours(23));
        let stale = Timestamp::from_offset_date_time(then.as_offset_date_time() + Duration::hours(25));
        assert!(!then.is_older_than(24 * 3600, still_fresh));
        assert!(then.is_older_than(24 * 3600, stale));
    }
}
