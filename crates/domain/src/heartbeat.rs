//! Controller heartbeats: proof of life posted by the greenhouse controller.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::log::LogRecord;
use crate::time::Timestamp;

/// One heartbeat. `state` is always `true`; absence of heartbeats is the
/// failure signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
    pub state: bool,
}

impl Heartbeat {
    #[must_use]
    pub fn at(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            state: true,
        }
    }
}

impl LogRecord for Heartbeat {
    type Key = ();

    const LOG_NAME: &'static str = "greenhouse_server_state";

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn matches(&self, _key: &Self::Key) -> bool {
        true
    }

    fn canonical_order(a: &Self, b: &Self) -> Ordering {
        b.timestamp.cmp(&a.timestamp)
    }
}
