//! Time and timestamp helpers.
//!
//! Log records carry UTC instants that cross the boundary as integer
//! milliseconds since the Unix epoch, so every server-assigned timestamp is
//! truncated to millisecond precision.

use chrono::{DateTime, Utc};

/// UTC timestamp used for log entries and the settings `updated_at` field.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time, truncated to whole milliseconds.
#[must_use]
pub fn now() -> Timestamp {
    let current = Utc::now();
    from_millis(current.timestamp_millis()).unwrap_or(current)
}

/// Interpret `millis` as milliseconds since the Unix epoch.
///
/// Returns `None` when the value falls outside chrono's representable range.
#[must_use]
pub fn from_millis(millis: i64) -> Option<Timestamp> {
    DateTime::from_timestamp_millis(millis)
}
