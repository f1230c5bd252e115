//! Inclusive time-range filter shared by every bounded log.

use chrono::{DateTime, Duration, Utc};

use crate::error::ValidationError;
use crate::time::{Timestamp, from_millis};

/// How far back a window reaches when the caller gives no start.
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 10;

/// Inclusive `[start, end]` range of UTC instants.
///
/// An inverted window (`start > end`) is legal and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl QueryWindow {
    #[must_use]
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Every representable instant.
    #[must_use]
    pub fn everything() -> Self {
        Self::new(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
    }

    /// The last [`DEFAULT_LOOKBACK_MINUTES`] up to `now`.
    #[must_use]
    pub fn recent(now: Timestamp) -> Self {
        Self::new(now - Duration::minutes(DEFAULT_LOOKBACK_MINUTES), now)
    }

    /// Build a window from optional millisecond bounds.
    ///
    /// A missing `end` means `now`; a missing `start` means
    /// [`DEFAULT_LOOKBACK_MINUTES`] before `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimeRange`] if a bound is outside the
    /// representable range.
    pub fn from_millis(
        start: Option<i64>,
        end: Option<i64>,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let bound = |millis: i64| from_millis(millis).ok_or(ValidationError::InvalidTimeRange);
        let default = Self::recent(now);
        Ok(Self {
            start: start.map(bound).transpose()?.unwrap_or(default.start),
            end: end.map(bound).transpose()?.unwrap_or(default.end),
        })
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    #[must_use]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts <= self.end
    }

    #[must_use]
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    #[must_use]
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}
