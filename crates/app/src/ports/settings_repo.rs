//! Settings repository port: the singleton settings record.

use std::future::Future;

use greenhouse_domain::error::GreenhouseError;
use greenhouse_domain::settings::{Settings, StoredSettings};
use greenhouse_domain::time::Timestamp;

/// Persistence for the single authoritative [`Settings`] record.
pub trait SettingsRepository {
    /// The stored settings, if any have been written.
    fn current(&self) -> impl Future<Output = Result<Option<StoredSettings>, GreenhouseError>> + Send;

    /// Atomically replace the whole record, stamping it with `at`.
    fn replace(
        &self,
        settings: Settings,
        at: Timestamp,
    ) -> impl Future<Output = Result<StoredSettings, GreenhouseError>> + Send;
}
