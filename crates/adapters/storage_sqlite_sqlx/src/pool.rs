//! `SQLite` connection pool setup and migration runner.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use greenhouse_domain::actuator::ActuatorTransition;
use greenhouse_domain::heartbeat::Heartbeat;
use greenhouse_domain::reading::SensorReading;

use crate::actuator_repo::SqliteActuatorRepository;
use crate::bounded_log::SqliteBoundedLog;
use crate::error::StorageError;
use crate::provision::SqliteProvisioner;
use crate::settings_repo::SqliteSettingsRepository;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the `SQLite` storage adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:greenhouse.db` or `sqlite::memory:`).
    pub database_url: String,
    /// Upper bound of the connection pool. Ignored for in-memory databases,
    /// which always use a single connection.
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:greenhouse.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Config {
    /// A private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }

    /// Whether the URL points at an in-memory database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// Build a [`Database`] from this configuration.
    ///
    /// Creates the connection pool, creates the database file if missing,
    /// and runs all pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    pub async fn build(self) -> Result<Database, StorageError> {
        Database::open(&self).await
    }
}

/// Owned handle on the store. Every repository is created from it and shares
/// its pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    #[tracing::instrument(skip(config), fields(database_url = %config.database_url))]
    pub async fn open(config: &Config) -> Result<Self, StorageError> {
        let mut options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);

        // Every connection to `:memory:` is its own database, so in-memory
        // stores are pinned to one connection that is never recycled.
        let pool_options = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("database ready");
        Ok(Self { pool })
    }

    /// Close every connection. Outstanding repositories fail afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn actuators(&self) -> SqliteActuatorRepository {
        SqliteActuatorRepository::new(self.pool.clone())
    }

    #[must_use]
    pub fn transitions(&self) -> SqliteBoundedLog<ActuatorTransition> {
        SqliteBoundedLog::new(self.pool.clone())
    }

    #[must_use]
    pub fn readings(&self) -> SqliteBoundedLog<SensorReading> {
        SqliteBoundedLog::new(self.pool.clone())
    }

    #[must_use]
    pub fn heartbeats(&self) -> SqliteBoundedLog<Heartbeat> {
        SqliteBoundedLog::new(self.pool.clone())
    }

    #[must_use]
    pub fn settings(&self) -> SqliteSettingsRepository {
        SqliteSettingsRepository::new(self.pool.clone())
    }

    #[must_use]
    pub fn provisioner(&self) -> SqliteProvisioner {
        SqliteProvisioner::new(self.pool.clone())
    }
}
