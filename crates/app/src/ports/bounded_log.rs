//! Bounded log port: fixed-capacity, time-indexed, append-only storage.

use std::future::Future;

use greenhouse_domain::error::GreenhouseError;
use greenhouse_domain::log::LogRecord;
use greenhouse_domain::query::QueryWindow;

/// A log of `T` holding at most [`capacity`](BoundedLog::capacity) records.
///
/// Appending to a full log evicts the oldest records by insertion order in
/// the same atomic unit as the insert. Records are never updated or deleted
/// otherwise.
pub trait BoundedLog<T: LogRecord> {
    /// Append `record`, returning it as stored.
    fn append(&self, record: T) -> impl Future<Output = Result<T, GreenhouseError>> + Send;

    /// Records of the `key` partition whose timestamp lies in `window`, in
    /// the record type's canonical order.
    ///
    /// Each call materialises a fresh `Vec`; an inverted window yields an
    /// empty one.
    fn query(
        &self,
        key: &T::Key,
        window: QueryWindow,
    ) -> impl Future<Output = Result<Vec<T>, GreenhouseError>> + Send;

    /// Maximum number of records retained.
    fn capacity(&self) -> impl Future<Output = Result<u32, GreenhouseError>> + Send;
}
