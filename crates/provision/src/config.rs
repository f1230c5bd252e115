//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `greenhouse.toml` in the working directory, or the file named by
//! `GREENHOUSE_CONFIG`. Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use std::path::Path;

use serde::{Deserialize, Deserializer};

use greenhouse_adapter_storage_sqlite_sqlx::Config as StorageConfig;
use greenhouse_domain::error::ValidationError;
use greenhouse_domain::provision::{ActuatorPlan, LogCapacities, ProvisionPlan, SettingsDefaults};

/// File read when `GREENHOUSE_CONFIG` is unset.
pub const DEFAULT_PATH: &str = "greenhouse.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    pub fans: FansConfig,
    pub heaters: HeatersConfig,
    pub solenoids: SolenoidsConfig,
    pub lights: LightsConfig,
    /// Settings written when the `settings` table is initialised.
    pub settings: SettingsConfig,
    /// Capacity of each bounded log.
    pub logs: LogsConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL.
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FansConfig {
    /// Fans named `fan01`, `fan02`, …
    pub number_small_fans: u32,
    /// Extra fans created under their own names. Accepts a list or a comma
    /// separated string.
    #[serde(deserialize_with = "list_or_csv")]
    pub additional_fans: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeatersConfig {
    pub number_heaters: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SolenoidsConfig {
    pub number_solenoids: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub number_lights: u32,
}

/// Initial control settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub manual_mode: bool,
    pub min_temperature: i64,
    pub max_temperature: i64,
    pub min_soil_moisture: i64,
    pub max_soil_moisture: i64,
    /// Any time expression the settings validation accepts (`06:00`, `6am`, …).
    pub lights_start_time: String,
    pub lights_end_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    pub transition_capacity: u32,
    pub reading_capacity: u32,
    pub heartbeat_capacity: u32,
}

impl Config {
    /// Load configuration from `GREENHOUSE_CONFIG` or `greenhouse.toml` (if
    /// present) then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration does not validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("GREENHOUSE_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        Self::load_from(path)
    }

    /// Like [`load`](Self::load) with an explicit file path.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path.as_ref())?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("GREENHOUSE_DATABASE_URL") {
            self.database.url = val;
        }
    }

    /// Check that the configuration yields a valid provisioning plan.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] with the first rule violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.plan()?;
        Ok(())
    }

    /// Turn the configuration into a provisioning plan.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the default settings or a log
    /// capacity are invalid.
    pub fn plan(&self) -> Result<ProvisionPlan, ValidationError> {
        let actuators = ActuatorPlan {
            small_fans: self.fans.number_small_fans,
            additional_fans: self.fans.additional_fans.clone(),
            heaters: self.heaters.number_heaters,
            solenoids: self.solenoids.number_solenoids,
            lights: self.lights.number_lights,
        };
        let defaults = SettingsDefaults {
            manual_mode: self.settings.manual_mode,
            min_temperature: self.settings.min_temperature,
            max_temperature: self.settings.max_temperature,
            min_soil_moisture: self.settings.min_soil_moisture,
            max_soil_moisture: self.settings.max_soil_moisture,
            lights_start_time: self.settings.lights_start_time.clone(),
            lights_end_time: self.settings.lights_end_time.clone(),
        };
        let capacities = LogCapacities {
            transitions: self.logs.transition_capacity,
            readings: self.logs.reading_capacity,
            heartbeats: self.logs.heartbeat_capacity,
        };
        ProvisionPlan::new(&actuators, &defaults, capacities)
    }

    /// Storage adapter configuration for the configured database.
    #[must_use]
    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            database_url: self.database.url.clone(),
            max_connections: self.database.max_connections,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let storage = StorageConfig::default();
        Self {
            url: storage.database_url,
            max_connections: storage.max_connections,
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        let defaults = SettingsDefaults::default();
        Self {
            manual_mode: defaults.manual_mode,
            min_temperature: defaults.min_temperature,
            max_temperature: defaults.max_temperature,
            min_soil_moisture: defaults.min_soil_moisture,
            max_soil_moisture: defaults.max_soil_moisture,
            lights_start_time: defaults.lights_start_time,
            lights_end_time: defaults.lights_end_time,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        let capacities = LogCapacities::default();
        Self {
            transition_capacity: capacities.transitions,
            reading_capacity: capacities.readings,
            heartbeat_capacity: capacities.heartbeats,
        }
    }
}

fn list_or_csv<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Names {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Names::deserialize(deserializer)? {
        Names::List(names) => names,
        Names::Csv(text) => text.split(',').map(str::to_string).collect(),
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
}
