//! Staleness policies deciding whether a cached value may be served
//!
//! Two rules are supported:
//! - `Rolling`: the value is fresh while it is younger than a fixed TTL.
//! - `Aligned`: the value expires at the first `hh:offset` strictly after its
//!   fetch, so every hour boundary (plus the offset) resets the cache, and it
//!   never lives longer than one hour.
//!
//! A value that has never been fetched is always stale.

use chrono::{DateTime, Duration, DurationRound, Utc};

/// Hard upper bound on the age of a value under the aligned policy
const ALIGNED_MAX_AGE: Duration = Duration::hours(1);

/// Rule deciding whether a cached value is still fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessPolicy {
    /// Fresh iff `now - fetched_at < ttl`
    Rolling { ttl: Duration },
    /// Fresh iff `now` is before the first `hh:offset_minutes` mark after the
    /// fetch and the value is less than one hour old
    Aligned { offset_minutes: u32 },
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        StalenessPolicy::Rolling {
            ttl: Duration::hours(1),
        }
    }
}

impl StalenessPolicy {
    /// Returns the instant after which a value fetched at `fetched_at` is stale
    ///
    /// Returns `None` if the deadline cannot be represented.
    pub fn expires_at(&self, fetched_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            StalenessPolicy::Rolling { ttl } => fetched_at.checked_add_signed(ttl),
            StalenessPolicy::Aligned { offset_minutes } => {
                let offset = Duration::minutes(i64::from(offset_minutes));
                // Hour whose `hh:offset` mark is the last one at or before the fetch
                let hour_start = fetched_at
                    .checked_sub_signed(offset)?
                    .duration_trunc(Duration::hours(1))
                    .ok()?;
                let boundary = hour_start
                    .checked_add_signed(Duration::hours(1))?
                    .checked_add_signed(offset)?;
                let max_age = fetched_at.checked_add_signed(ALIGNED_MAX_AGE)?;
                Some(boundary.min(max_age))
            }
        }
    }

    /// Whether a value fetched at `fetched_at` may still be served at `now`
    ///
    /// `None` means the value was never fetched, which is always stale.
    pub fn is_fresh(&self, fetched_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(fetched_at) = fetched_at else {
            return false;
        };

        match *self {
            StalenessPolicy::Rolling { ttl } => now - fetched_at < ttl,
            StalenessPolicy::Aligned { .. } => match self.expires_at(fetched_at) {
                Some(expiration) => now < expiration && now - fetched_at < ALIGNED_MAX_AGE,
                None => false,
            },
        }
    }
}
