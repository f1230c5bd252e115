//! Common shape of records kept in a bounded log.

use std::cmp::Ordering;

use crate::time::Timestamp;

/// A record that lives in a fixed-capacity, time-indexed log.
///
/// Each log is partitioned by one attribute (actuator name, sensor type, …)
/// and returns its records in one canonical order.
pub trait LogRecord: Clone + Send + Sync + 'static {
    /// Attribute a query filters on.
    type Key: Send + Sync;

    /// Name of the log, also used as its storage table name.
    const LOG_NAME: &'static str;

    /// Instant the record was appended.
    fn timestamp(&self) -> Timestamp;

    /// Whether the record belongs to the `key` partition.
    fn matches(&self, key: &Self::Key) -> bool;

    /// Canonical query order between two records.
    fn canonical_order(a: &Self, b: &Self) -> Ordering;
}
