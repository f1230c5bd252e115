//! Re-initialisation of individual tables from a [`ProvisionPlan`].

use sqlx::{Sqlite, SqlitePool, Transaction};

use greenhouse_domain::actuator::Actuator;
use greenhouse_domain::error::{ConflictError, GreenhouseError};
use greenhouse_domain::provision::{ProvisionPlan, Table};
use greenhouse_domain::time::now;

use crate::error::StorageError;
use crate::settings_repo::write_settings;

const INSERT_ACTUATOR: &str = "INSERT INTO actuators (name, type, state) VALUES (?, ?, ?)";

const UPSERT_CAPACITY: &str = r"
    INSERT INTO bounded_logs (name, capacity) VALUES (?, ?)
    ON CONFLICT (name) DO UPDATE SET capacity = excluded.capacity
";

/// Seeds and resets tables of a store.
#[derive(Clone)]
pub struct SqliteProvisioner {
    pool: SqlitePool,
}

impl SqliteProvisioner {
    /// Create a new provisioner using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Empty and reseed each of `tables` from `plan`, all in one transaction.
    ///
    /// `actuators` is refilled with the planned inventory, `settings` with
    /// the planned defaults, and each log is emptied and given its planned
    /// capacity. Tables not listed are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`GreenhouseError::Conflict`] if the plan names an actuator
    /// twice, or a storage error. Nothing is changed on failure.
    #[tracing::instrument(skip(self, plan))]
    pub async fn reinitialize(
        &self,
        plan: &ProvisionPlan,
        tables: &[Table],
    ) -> Result<(), GreenhouseError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        for &table in tables {
            clear(&mut tx, table).await?;
            match table {
                Table::Actuators => {
                    for actuator in &plan.actuators {
                        insert_actuator(&mut tx, actuator).await?;
                    }
                }
                Table::Settings => write_settings(&mut *tx, &plan.settings, now()).await?,
                Table::ActuatorsStateLog | Table::DataReadings | Table::GreenhouseServerState => {}
            }
            if let Some(capacity) = plan.capacities.for_table(table) {
                sqlx::query(UPSERT_CAPACITY)
                    .bind(table.as_str())
                    .bind(i64::from(capacity))
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;
            }
            tracing::info!(%table, "table reinitialized");
        }

        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}

async fn clear(tx: &mut Transaction<'_, Sqlite>, table: Table) -> Result<(), GreenhouseError> {
    // Table names come from a closed enum, never from input.
    let statement = format!("DELETE FROM {}", table.as_str());
    sqlx::query(&statement)
        .execute(&mut **tx)
        .await
        .map_err(StorageError::from)?;
    Ok(())
}

async fn insert_actuator(
    tx: &mut Transaction<'_, Sqlite>,
    actuator: &Actuator,
) -> Result<(), GreenhouseError> {
    actuator.validate()?;
    let result = sqlx::query(INSERT_ACTUATOR)
        .bind(&actuator.name)
        .bind(actuator.kind.as_str())
        .bind(actuator.state)
        .execute(&mut **tx)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Err(ConflictError {
            entity: "actuator",
            id: actuator.name.clone(),
        }
        .into()),
        Err(err) => Err(StorageError::from(err).into()),
    }
}
