//! Settings service: read and replace the singleton settings record.

use greenhouse_domain::error::GreenhouseError;
use greenhouse_domain::settings::{SettingsInput, SettingsView};
use greenhouse_domain::time::{Timestamp, now};

use crate::ports::SettingsRepository;

/// Application service for the control settings.
pub struct SettingsService<S> {
    repo: S,
}

impl<S: SettingsRepository> SettingsService<S> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: S) -> Self {
        Self { repo }
    }

    /// Current settings in display form, or the empty default when none
    /// have been stored yet.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn get_settings(&self) -> Result<SettingsView, GreenhouseError> {
        Ok(self
            .repo
            .current()
            .await?
            .map_or_else(SettingsView::default, |stored| stored.settings.view()))
    }

    /// When the settings were last replaced.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn updated_at(&self) -> Result<Option<Timestamp>, GreenhouseError> {
        Ok(self.repo.current().await?.map(|stored| stored.updated_at))
    }

    /// Validate `input` and replace the stored settings with it.
    ///
    /// Nothing is written when validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhouseError::Validation`] with the first rule violated,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self, input))]
    pub async fn upsert_settings(
        &self,
        input: SettingsInput,
    ) -> Result<SettingsView, GreenhouseError> {
        let settings = input
            .validate()
            .inspect_err(|err| tracing::warn!(%err, "rejected settings"))?;
        let stored = self.repo.replace(settings, now()).await?;
        tracing::info!(updated_at = %stored.updated_at, "settings replaced");
        Ok(stored.settings.view())
    }
}
