//! Time-of-day codec for schedules.
//!
//! Schedules are stored as integer seconds since midnight and displayed as
//! zero-padded `HH:MM`. Sub-minute precision is discarded on the way in.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Clock formats tried in order when parsing a bare time of day.
const TIME_FORMATS: &[&str] = &[
    "%H:%M",
    "%H:%M:%S",
    "%H%M",
    "%I:%M %p",
    "%I:%M%p",
    "%I:%M:%S %p",
    "%I:%M:%S%p",
];

/// Date-time formats whose time-of-day part is accepted as well.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A time of day in canonical seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    /// Build from an hour and minute.
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Self {
        Self(encode(hour, minute))
    }

    /// Wrap an already-encoded value.
    #[must_use]
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Seconds since midnight.
    #[must_use]
    pub fn seconds(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour = self.0 / 3600;
        let minute = (self.0 - hour * 3600) / 60;
        write!(f, "{hour:02}:{minute:02}")
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s).map(Self)
    }
}

/// `hour * 3600 + minute * 60`.
#[must_use]
pub fn encode(hour: u32, minute: u32) -> u32 {
    hour * 3600 + minute * 60
}

/// Render seconds since midnight as `HH:MM`; `None` renders as an empty string.
#[must_use]
pub fn decode(seconds: Option<u32>) -> String {
    seconds
        .map(|value| TimeOfDay(value).to_string())
        .unwrap_or_default()
}

/// Parse a common time expression into seconds since midnight.
///
/// Accepts 24-hour clock times (`9:05`, `14:00`, `14:00:30`, `1400`),
/// 12-hour times with a meridiem (`2pm`, `2:30 PM`, `11:15:10am`) and full
/// date-times, whose time-of-day part is used.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTime`] when no accepted form matches.
pub fn parse(text: &str) -> Result<u32, ValidationError> {
    let trimmed = text.trim();
    let clock = with_explicit_minutes(trimmed);

    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&clock, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.time())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.time())
        })
        .ok_or_else(|| ValidationError::InvalidTime(text.to_string()))?;

    Ok(encode(time.hour(), time.minute()))
}

/// chrono needs a minute field, so `2pm` becomes `2:00 pm`.
fn with_explicit_minutes(text: &str) -> Cow<'_, str> {
    let lower = text.to_ascii_lowercase();
    let Some(hour) = lower
        .strip_suffix("am")
        .or_else(|| lower.strip_suffix("pm"))
    else {
        return Cow::Borrowed(text);
    };
    if hour.contains(':') {
        return Cow::Borrowed(text);
    }
    let meridiem = &lower[lower.len() - 2..];
    Cow::Owned(format!("{}:00 {meridiem}", hour.trim_end()))
}
