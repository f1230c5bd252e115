//! # greenhouse-provision
//!
//! Provisioning for the greenhouse controller store.
//!
//! Reads the provisioning configuration ([`Config`]), turns it into a
//! [`ProvisionPlan`] and re-initialises the requested tables of a database:
//! actuators are recreated switched off, settings are reset to the configured
//! defaults, and bounded logs are emptied and given their configured
//! capacity.

pub mod config;

pub use config::{Config, ConfigError};

use greenhouse_adapter_storage_sqlite_sqlx::{Database, StorageError};
use greenhouse_domain::error::{GreenhouseError, ValidationError};
use greenhouse_domain::provision::{ProvisionPlan, Table};

/// Errors raised while provisioning a store.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database could not be opened or migrated.
    #[error("failed to open database")]
    Storage(#[from] StorageError),

    /// Seeding the tables failed.
    #[error(transparent)]
    Store(#[from] GreenhouseError),
}

impl From<ValidationError> for ProvisionError {
    fn from(err: ValidationError) -> Self {
        Self::Store(err.into())
    }
}

/// Open the configured database, re-initialise `tables` and close it again.
///
/// # Errors
///
/// Returns [`ProvisionError`] if the configuration is invalid, the database
/// cannot be opened, or seeding fails. A failed seeding leaves every table
/// as it was.
#[tracing::instrument(skip(config), fields(database_url = %config.database.url))]
pub async fn reinitialize(config: &Config, tables: &[Table]) -> Result<(), ProvisionError> {
    let plan = config.plan().map_err(ConfigError::from)?;
    let db = config.storage().build().await?;
    let result = apply(&db, &plan, tables).await;
    db.close().await;
    result
}

/// Like [`reinitialize`], taking the tables as a comma separated list such as
/// `actuators,settings`.
///
/// # Errors
///
/// Returns [`ProvisionError::Store`] for an unknown table name, otherwise see
/// [`reinitialize`].
pub async fn reinitialize_listed(config: &Config, tables: &str) -> Result<(), ProvisionError> {
    let tables = Table::parse_list(tables)?;
    reinitialize(config, &tables).await
}

/// Re-initialise `tables` of an already open database.
///
/// # Errors
///
/// Returns [`ProvisionError`] if the configuration is invalid or seeding
/// fails.
pub async fn reinitialize_on(
    db: &Database,
    config: &Config,
    tables: &[Table],
) -> Result<(), ProvisionError> {
    let plan = config.plan().map_err(ConfigError::from)?;
    apply(db, &plan, tables).await
}

async fn apply(db: &Database, plan: &ProvisionPlan, tables: &[Table]) -> Result<(), ProvisionError> {
    if tables.is_empty() {
        tracing::warn!("no tables selected, nothing to do");
        return Ok(());
    }
    db.provisioner().reinitialize(plan, tables).await?;
    tracing::info!(
        actuators = plan.actuators.len(),
        tables = tables.len(),
        "provisioning complete"
    );
    Ok(())
}
