//! `SQLite` implementation of [`SettingsRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, FromRow, Row, Sqlite, SqlitePool};

use greenhouse_app::ports::SettingsRepository;
use greenhouse_domain::error::GreenhouseError;
use greenhouse_domain::settings::{LightSchedule, Settings, StoredSettings, Threshold};
use greenhouse_domain::time::{Timestamp, from_millis};
use greenhouse_domain::time_of_day::TimeOfDay;

use crate::error::{StorageError, decode_error};

struct Wrapper(StoredSettings);

fn time_of_day(row: &SqliteRow, column: &str) -> Result<TimeOfDay, sqlx::Error> {
    let seconds: i64 = row.try_get(column)?;
    u32::try_from(seconds)
        .map(TimeOfDay::from_seconds)
        .map_err(decode_error)
}

fn json_column<T: serde::de::DeserializeOwned>(
    row: &SqliteRow,
    column: &str,
) -> Result<T, sqlx::Error> {
    let text: String = row.try_get(column)?;
    serde_json::from_str(&text).map_err(decode_error)
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let updated_at: i64 = row.try_get("updated_at")?;
        let updated_at = from_millis(updated_at)
            .ok_or_else(|| decode_error(format!("updated_at {updated_at} out of range")))?;

        Ok(Self(StoredSettings {
            settings: Settings {
                manual_mode: row.try_get("is_manual_mode")?,
                temperature: Threshold {
                    min: row.try_get("temperature_min")?,
                    max: row.try_get("temperature_max")?,
                },
                soil_moisture: Threshold {
                    min: row.try_get("soil_moisture_min")?,
                    max: row.try_get("soil_moisture_max")?,
                },
                lights: LightSchedule {
                    start_time: time_of_day(row, "lights_start_time")?,
                    end_time: time_of_day(row, "lights_end_time")?,
                },
                watering_times: json_column(row, "watering_times")?,
                error_flush_times: json_column(row, "error_flush_times")?,
                email_addresses: json_column(row, "email_addresses")?,
            },
            updated_at,
        }))
    }
}

const SELECT: &str = "SELECT * FROM settings WHERE id = 1";

const UPSERT: &str = r"
    INSERT INTO settings (
        id, is_manual_mode,
        temperature_min, temperature_max,
        soil_moisture_min, soil_moisture_max,
        lights_start_time, lights_end_time,
        watering_times, error_flush_times, email_addresses,
        updated_at
    )
    VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (id) DO UPDATE SET
        is_manual_mode = excluded.is_manual_mode,
        temperature_min = excluded.temperature_min,
        temperature_max = excluded.temperature_max,
        soil_moisture_min = excluded.soil_moisture_min,
        soil_moisture_max = excluded.soil_moisture_max,
        lights_start_time = excluded.lights_start_time,
        lights_end_time = excluded.lights_end_time,
        watering_times = excluded.watering_times,
        error_flush_times = excluded.error_flush_times,
        email_addresses = excluded.email_addresses,
        updated_at = excluded.updated_at
";

/// Write `settings` as the singleton row in one statement.
pub(crate) async fn write_settings<'e, E>(
    executor: E,
    settings: &Settings,
    at: Timestamp,
) -> Result<(), StorageError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let watering_times = serde_json::to_string(&settings.watering_times)?;
    let error_flush_times = serde_json::to_string(&settings.error_flush_times)?;
    let email_addresses = serde_json::to_string(&settings.email_addresses)?;

    sqlx::query(UPSERT)
        .bind(settings.manual_mode)
        .bind(settings.temperature.min)
        .bind(settings.temperature.max)
        .bind(settings.soil_moisture.min)
        .bind(settings.soil_moisture.max)
        .bind(i64::from(settings.lights.start_time.seconds()))
        .bind(i64::from(settings.lights.end_time.seconds()))
        .bind(watering_times)
        .bind(error_flush_times)
        .bind(email_addresses)
        .bind(at.timestamp_millis())
        .execute(executor)
        .await?;
    Ok(())
}

/// `SQLite`-backed settings repository.
#[derive(Clone)]
pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SettingsRepository for SqliteSettingsRepository {
    async fn current(&self) -> Result<Option<StoredSettings>, GreenhouseError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }

    async fn replace(
        &self,
        settings: Settings,
        at: Timestamp,
    ) -> Result<StoredSettings, GreenhouseError> {
        write_settings(&self.pool, &settings, at).await?;
        Ok(StoredSettings {
            settings,
            updated_at: at,
        })
    }
}
