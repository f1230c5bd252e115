//! `SQLite` implementation of [`BoundedLog`] over enforced-bound tables.
//!
//! Each log is a table with a monotonically increasing `seq` column and a row
//! in `bounded_logs` holding its capacity. Every insert is followed, in the
//! same transaction, by a sweep deleting the rows that fell out of the newest
//! `capacity` sequence numbers.

use std::marker::PhantomData;

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};

use greenhouse_app::ports::BoundedLog;
use greenhouse_domain::actuator::ActuatorTransition;
use greenhouse_domain::error::GreenhouseError;
use greenhouse_domain::heartbeat::Heartbeat;
use greenhouse_domain::log::LogRecord;
use greenhouse_domain::query::QueryWindow;
use greenhouse_domain::reading::{Sensor, SensorReading};
use greenhouse_domain::time::{Timestamp, from_millis};

use crate::error::{StorageError, decode_error};

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

const SELECT_CAPACITY: &str = "SELECT capacity FROM bounded_logs WHERE name = ?";

/// Row mapping of a [`LogRecord`] stored in its own table.
pub trait LogTable: LogRecord {
    /// Inserts one record; parameters bound by [`bind_insert`](Self::bind_insert).
    const INSERT: &'static str;

    /// Deletes everything older than the newest `capacity` rows. Takes the
    /// log name as its only parameter.
    const EVICT: &'static str;

    /// Selects a partition within a window: key parameters first (bound by
    /// [`bind_key`](Self::bind_key)), then window start and end in
    /// milliseconds. Rows come back in canonical order.
    const SELECT: &'static str;

    fn bind_insert<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;

    fn bind_key<'q>(key: &Self::Key, query: SqliteQuery<'q>) -> SqliteQuery<'q>;

    /// Decode one row selected by [`SELECT`](Self::SELECT).
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if a column is missing or holds an unusable
    /// value.
    fn decode(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

fn timestamp(row: &SqliteRow) -> Result<Timestamp, sqlx::Error> {
    let millis: i64 = row.try_get("timestamp")?;
    from_millis(millis).ok_or_else(|| decode_error(format!("timestamp {millis} out of range")))
}

impl LogTable for ActuatorTransition {
    const INSERT: &'static str = r"
        INSERT INTO actuators_state_log (name, to_state, timestamp)
        VALUES (?, ?, ?)
    ";

    const EVICT: &'static str = r"
        DELETE FROM actuators_state_log
        WHERE seq <= (SELECT MAX(seq) FROM actuators_state_log)
                   - (SELECT capacity FROM bounded_logs WHERE name = ?)
    ";

    const SELECT: &'static str = r"
        SELECT name, to_state, timestamp FROM actuators_state_log
        WHERE name = ? AND timestamp >= ? AND timestamp <= ?
        ORDER BY timestamp DESC, seq DESC
    ";

    fn bind_insert<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.to_state)
            .bind(self.timestamp.timestamp_millis())
    }

    fn bind_key<'q>(key: &Self::Key, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(key.clone())
    }

    fn decode(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            name: row.try_get("name")?,
            to_state: row.try_get("to_state")?,
            timestamp: timestamp(row)?,
        })
    }
}

impl LogTable for SensorReading {
    const INSERT: &'static str = r"
        INSERT INTO data_readings (sensor_name, sensor_type, reading, health, timestamp)
        VALUES (?, ?, ?, ?, ?)
    ";

    const EVICT: &'static str = r"
        DELETE FROM data_readings
        WHERE seq <= (SELECT MAX(seq) FROM data_readings)
                   - (SELECT capacity FROM bounded_logs WHERE name = ?)
    ";

    const SELECT: &'static str = r"
        SELECT sensor_name, sensor_type, reading, health, timestamp FROM data_readings
        WHERE sensor_type = ? AND timestamp >= ? AND timestamp <= ?
        ORDER BY sensor_name ASC, timestamp DESC, seq DESC
    ";

    fn bind_insert<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.sensor.name.clone())
            .bind(self.sensor.sensor_type.clone())
            .bind(self.reading)
            .bind(self.health.map(|health| health.as_str()))
            .bind(self.timestamp.timestamp_millis())
    }

    fn bind_key<'q>(key: &Self::Key, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(key.clone())
    }

    fn decode(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let health: Option<String> = row.try_get("health")?;
        Ok(Self {
            timestamp: timestamp(row)?,
            reading: row.try_get("reading")?,
            sensor: Sensor {
                name: row.try_get("sensor_name")?,
                sensor_type: row.try_get("sensor_type")?,
            },
            health: health
                .map(|label| label.parse())
                .transpose()
                .map_err(decode_error)?,
        })
    }
}

impl LogTable for Heartbeat {
    const INSERT: &'static str = r"
        INSERT INTO greenhouse_server_state (state, timestamp)
        VALUES (?, ?)
    ";

    const EVICT: &'static str = r"
        DELETE FROM greenhouse_server_state
        WHERE seq <= (SELECT MAX(seq) FROM greenhouse_server_state)
                   - (SELECT capacity FROM bounded_logs WHERE name = ?)
    ";

    const SELECT: &'static str = r"
        SELECT state, timestamp FROM greenhouse_server_state
        WHERE timestamp >= ? AND timestamp <= ?
        ORDER BY timestamp DESC, seq DESC
    ";

    fn bind_insert<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.state)
            .bind(self.timestamp.timestamp_millis())
    }

    fn bind_key<'q>(_key: &Self::Key, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
    }

    fn decode(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            timestamp: timestamp(row)?,
            state: row.try_get("state")?,
        })
    }
}

/// Insert `record` and sweep its table back down to capacity.
///
/// Callers run this inside a transaction so the insert and the eviction
/// commit together.
pub(crate) async fn append_on<T: LogTable>(
    conn: &mut SqliteConnection,
    record: &T,
) -> Result<(), sqlx::Error> {
    record
        .bind_insert(sqlx::query(T::INSERT))
        .execute(&mut *conn)
        .await?;
    let evicted = sqlx::query(T::EVICT)
        .bind(T::LOG_NAME)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if evicted > 0 {
        tracing::debug!(log = T::LOG_NAME, evicted, "evicted oldest records");
    }
    Ok(())
}

/// `SQLite`-backed bounded log of `T`.
pub struct SqliteBoundedLog<T> {
    pool: SqlitePool,
    _record: PhantomData<fn() -> T>,
}

impl<T> SqliteBoundedLog<T> {
    /// Create a new log using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

impl<T> Clone for SqliteBoundedLog<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T: LogTable> BoundedLog<T> for SqliteBoundedLog<T> {
    async fn append(&self, record: T) -> Result<T, GreenhouseError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        append_on(&mut tx, &record)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;
        Ok(record)
    }

    async fn query(&self, key: &T::Key, window: QueryWindow) -> Result<Vec<T>, GreenhouseError> {
        let rows = T::bind_key(key, sqlx::query(T::SELECT))
            .bind(window.start_millis())
            .bind(window.end_millis())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let records = rows
            .iter()
            .map(T::decode)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;
        Ok(records)
    }

    async fn capacity(&self) -> Result<u32, GreenhouseError> {
        let capacity: i64 = sqlx::query_scalar(SELECT_CAPACITY)
            .bind(T::LOG_NAME)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        let capacity = u32::try_from(capacity)
            .map_err(decode_error)
            .map_err(StorageError::from)?;
        Ok(capacity)
    }
}
