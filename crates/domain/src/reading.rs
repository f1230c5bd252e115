//! Sensor telemetry: unit normalization, battery health and the reading
//! record kept in the reading log.
//!
//! Every reading is stored in one canonical unit per sensor type regardless
//! of the unit it was submitted in:
//!
//! | type | submitted unit | stored as |
//! |---|---|---|
//! | `soil` | `soil_raw` (0–1023 ADC counts) | percent, capped at 100 |
//! | `temp` | `temp_c` | degrees Fahrenheit |
//! | anything else | any | unchanged |

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::log::LogRecord;
use crate::time::Timestamp;

pub const SOIL: &str = "soil";
pub const TEMPERATURE: &str = "temp";
pub const BATTERY: &str = "batt";

const SOIL_RAW: &str = "soil_raw";
const TEMP_CELSIUS: &str = "temp_c";

/// Full-scale value of the soil probe's ADC.
const SOIL_RAW_FULL_SCALE: f64 = 1023.0;

/// Convert `reading` submitted in `unit` to the canonical unit of `sensor_type`.
///
/// Raw soil counts are capped at 100 % but negative counts are passed through
/// as negative percentages.
#[must_use]
pub fn normalize(reading: f64, sensor_type: &str, unit: Option<&str>) -> f64 {
    let Some(unit) = unit else {
        return reading;
    };
    if sensor_type == SOIL && unit.eq_ignore_ascii_case(SOIL_RAW) {
        (reading / SOIL_RAW_FULL_SCALE * 100.0).min(100.0)
    } else if sensor_type == TEMPERATURE && unit.eq_ignore_ascii_case(TEMP_CELSIUS) {
        reading * 9.0 / 5.0 + 32.0
    } else {
        reading
    }
}

/// Health bucket of a battery voltage reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryHealth {
    Good,
    Low,
    Critical,
}

impl BatteryHealth {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Low => "low",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for BatteryHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatteryHealth {
    type Err = UnknownBatteryHealth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(Self::Good),
            "low" => Ok(Self::Low),
            "critical" => Ok(Self::Critical),
            other => Err(UnknownBatteryHealth(other.to_string())),
        }
    }
}

/// Returned when a stored health label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown battery health '{0}'")]
pub struct UnknownBatteryHealth(pub String);

/// `good` above 5 V, `low` above 4 V, `critical` otherwise.
#[must_use]
pub fn classify_battery(reading: f64) -> BatteryHealth {
    if reading > 5.0 {
        BatteryHealth::Good
    } else if reading > 4.0 {
        BatteryHealth::Low
    } else {
        BatteryHealth::Critical
    }
}

/// Coerce a submitted reading to a number.
///
/// JSON numbers and numeric strings are accepted. Non-finite values are
/// rejected since they cannot be stored or compared.
///
/// # Errors
///
/// Returns [`ValidationError::NonNumericReading`] for anything else.
pub fn numeric_reading(value: &Value) -> Result<f64, ValidationError> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .ok_or(ValidationError::NonNumericReading)
}

/// Identity of the sensor that produced a reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: String,
}

/// One normalized reading as stored in the reading log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
    pub reading: f64,
    pub sensor: Sensor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<BatteryHealth>,
}

impl SensorReading {
    /// Validate and normalize a submitted reading, stamping it with `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] if the sensor name, sensor
    /// type or reading is absent, and [`ValidationError::NonNumericReading`]
    /// if the reading is not a number.
    pub fn from_input(input: ReadingInput, at: Timestamp) -> Result<Self, ValidationError> {
        let ReadingInput {
            sensor,
            reading,
            unit,
        } = input;
        let (Some(SensorInput {
            name: Some(name),
            sensor_type: Some(sensor_type),
        }), Some(raw)) = (sensor, reading)
        else {
            return Err(ValidationError::MissingFields);
        };

        let value = normalize(numeric_reading(&raw)?, &sensor_type, unit.as_deref());
        let health = (sensor_type == BATTERY).then(|| classify_battery(value));

        Ok(Self {
            timestamp: at,
            reading: value,
            sensor: Sensor { name, sensor_type },
            health,
        })
    }
}

impl LogRecord for SensorReading {
    type Key = String;

    const LOG_NAME: &'static str = "data_readings";

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn matches(&self, key: &Self::Key) -> bool {
        &self.sensor.sensor_type == key
    }

    fn canonical_order(a: &Self, b: &Self) -> Ordering {
        a.sensor
            .name
            .cmp(&b.sensor.name)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    }
}

/// Reading as submitted, before presence checks and normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingInput {
    pub sensor: Option<SensorInput>,
    pub reading: Option<Value>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub sensor_type: Option<String>,
}

impl ReadingInput {
    /// Convenience constructor for a fully specified reading.
    #[must_use]
    pub fn new(
        sensor_name: impl Into<String>,
        sensor_type: impl Into<String>,
        reading: impl Into<Value>,
        unit: Option<&str>,
    ) -> Self {
        Self {
            sensor: Some(SensorInput {
                name: Some(sensor_name.into()),
                sensor_type: Some(sensor_type.into()),
            }),
            reading: Some(reading.into()),
            unit: unit.map(str::to_string),
        }
    }
}
