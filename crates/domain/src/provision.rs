//! Provisioning plan: the actuators, default settings and log capacities a
//! freshly (re)initialised store starts with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::actuator::{Actuator, ActuatorKind, ActuatorTransition};
use crate::error::ValidationError;
use crate::heartbeat::Heartbeat;
use crate::log::LogRecord;
use crate::reading::SensorReading;
use crate::settings::{LightsInput, Settings, SettingsInput, ThresholdInput};

/// How many actuators of each kind to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActuatorPlan {
    pub small_fans: u32,
    pub additional_fans: Vec<String>,
    pub heaters: u32,
    pub solenoids: u32,
    pub lights: u32,
}

impl ActuatorPlan {
    /// Expand the plan into actuators, all switched off.
    ///
    /// Numbered actuators are named `<prefix>NN`, 1-based and zero-padded to
    /// two digits. Additional fans keep their configured names; blank entries
    /// are skipped.
    #[must_use]
    pub fn actuators(&self) -> Vec<Actuator> {
        let numbered = |prefix: &'static str, count: u32, kind: ActuatorKind| {
            (1..=count).map(move |index| Actuator::new(format!("{prefix}{index:02}"), kind))
        };
        let extra_fans = self
            .additional_fans
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| Actuator::new(name, ActuatorKind::Fan));

        numbered("fan", self.small_fans, ActuatorKind::Fan)
            .chain(extra_fans)
            .chain(numbered("heater", self.heaters, ActuatorKind::Heater))
            .chain(numbered("solenoid", self.solenoids, ActuatorKind::Water))
            .chain(numbered("lights", self.lights, ActuatorKind::Lights))
            .collect()
    }
}

/// Initial settings written at provisioning time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDefaults {
    pub manual_mode: bool,
    pub min_temperature: i64,
    pub max_temperature: i64,
    pub min_soil_moisture: i64,
    pub max_soil_moisture: i64,
    pub lights_start_time: String,
    pub lights_end_time: String,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            manual_mode: false,
            min_temperature: 60,
            max_temperature: 85,
            min_soil_moisture: 30,
            max_soil_moisture: 70,
            lights_start_time: "06:00".to_string(),
            lights_end_time: "20:00".to_string(),
        }
    }
}

impl SettingsDefaults {
    /// The defaults in submitted form, with empty schedules and no addresses.
    #[must_use]
    pub fn input(&self) -> SettingsInput {
        let threshold = |min: i64, max: i64| ThresholdInput {
            min: Some(min.into()),
            max: Some(max.into()),
        };
        SettingsInput {
            manual_mode: self.manual_mode,
            temperature: Some(threshold(self.min_temperature, self.max_temperature)),
            soil_moisture: Some(threshold(self.min_soil_moisture, self.max_soil_moisture)),
            lights: Some(LightsInput {
                start_time: Some(self.lights_start_time.clone()),
                end_time: Some(self.lights_end_time.clone()),
            }),
            watering_times: Some(Vec::new()),
            error_flush_times: Some(Vec::new()),
            email_addresses: Some(Vec::new()),
        }
    }

    /// Run the defaults through the same rules as a settings upsert.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] the defaults violate.
    pub fn validate(&self) -> Result<Settings, ValidationError> {
        self.input().validate()
    }
}

/// Record capacity of each bounded log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogCapacities {
    pub transitions: u32,
    pub readings: u32,
    pub heartbeats: u32,
}

impl Default for LogCapacities {
    fn default() -> Self {
        Self {
            transitions: 1_000_000,
            readings: 3_500_000,
            heartbeats: 50_000,
        }
    }
}

impl LogCapacities {
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroCapacity`] naming the first log whose
    /// capacity is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        [
            Table::ActuatorsStateLog,
            Table::DataReadings,
            Table::GreenhouseServerState,
        ]
        .into_iter()
        .find(|table| self.for_table(*table) == Some(0))
        .map_or(Ok(()), |table| Err(ValidationError::ZeroCapacity(table.as_str())))
    }

    /// Capacity of `table`, `None` for tables that are not logs.
    #[must_use]
    pub fn for_table(&self, table: Table) -> Option<u32> {
        match table {
            Table::ActuatorsStateLog => Some(self.transitions),
            Table::DataReadings => Some(self.readings),
            Table::GreenhouseServerState => Some(self.heartbeats),
            Table::Actuators | Table::Settings => None,
        }
    }
}

/// A re-initialisable table of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Actuators,
    ActuatorsStateLog,
    Settings,
    DataReadings,
    GreenhouseServerState,
}

impl Table {
    pub const ALL: [Self; 5] = [
        Self::Actuators,
        Self::ActuatorsStateLog,
        Self::Settings,
        Self::DataReadings,
        Self::GreenhouseServerState,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Actuators => "actuators",
            Self::ActuatorsStateLog => ActuatorTransition::LOG_NAME,
            Self::Settings => "settings",
            Self::DataReadings => SensorReading::LOG_NAME,
            Self::GreenhouseServerState => Heartbeat::LOG_NAME,
        }
    }

    /// Parse a comma separated list such as `actuators,settings`.
    ///
    /// Blank entries are ignored and repeated names collapse to one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTable`] for the first unknown name.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, ValidationError> {
        let mut tables = Vec::new();
        for name in text.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            let table = name.parse()?;
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        Ok(tables)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownTable(s.to_string()))
    }
}

/// Everything needed to seed a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub actuators: Vec<Actuator>,
    pub settings: Settings,
    pub capacities: LogCapacities,
}

impl ProvisionPlan {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the default settings or the capacities
    /// are invalid.
    pub fn new(
        actuators: &ActuatorPlan,
        defaults: &SettingsDefaults,
        capacities: LogCapacities,
    ) -> Result<Self, ValidationError> {
        capacities.validate()?;
        Ok(Self {
            actuators: actuators.actuators(),
            settings: defaults.validate()?,
            capacities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_of_day::TimeOfDay;

    fn names(actuators: &[Actuator]) -> Vec<&str> {
        actuators.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn should_expand_plan_in_creation_order() {
        let plan = ActuatorPlan {
            small_fans: 2,
            additional_fans: vec!["bigfan".to_string()],
            heaters: 1,
            solenoids: 1,
            lights: 1,
        };
        let actuators = plan.actuators();
        assert_eq!(
            names(&actuators),
            ["fan01", "fan02", "bigfan", "heater01", "solenoid01", "lights01"]
        );
        assert!(actuators.iter().all(|a| !a.state));
        assert_eq!(actuators[3].kind, ActuatorKind::Heater);
        assert_eq!(actuators[4].kind, ActuatorKind::Water);
        assert_eq!(actuators[5].kind, ActuatorKind::Lights);
    }

    #[test]
    fn should_skip_blank_additional_fans() {
        let plan = ActuatorPlan {
            additional_fans: vec![String::new(), " exhaust ".to_string(), "  ".to_string()],
            ..ActuatorPlan::default()
        };
        assert_eq!(names(&plan.actuators()), ["exhaust"]);
    }

    #[test]
    fn should_pad_numbers_to_two_digits() {
        let plan = ActuatorPlan {
            heaters: 10,
            ..ActuatorPlan::default()
        };
        let actuators = plan.actuators();
        assert_eq!(actuators[0].name, "heater01");
        assert_eq!(actuators[9].name, "heater10");
    }

    #[test]
    fn should_validate_default_settings() {
        let settings = SettingsDefaults::default().validate().unwrap();
        assert_eq!(settings.lights.start_time, TimeOfDay::from_hm(6, 0));
        assert!(settings.watering_times.is_empty());
        assert!(settings.email_addresses.is_empty());
    }

    #[test]
    fn should_reject_defaults_with_inverted_temperature() {
        let defaults = SettingsDefaults {
            min_temperature: 90,
            max_temperature: 50,
            ..SettingsDefaults::default()
        };
        assert_eq!(defaults.validate(), Err(ValidationError::TemperatureRange));
    }

    #[test]
    fn should_reject_zero_capacity() {
        let capacities = LogCapacities {
            readings: 0,
            ..LogCapacities::default()
        };
        assert_eq!(
            capacities.validate(),
            Err(ValidationError::ZeroCapacity("data_readings"))
        );
        assert!(
            ProvisionPlan::new(&ActuatorPlan::default(), &SettingsDefaults::default(), capacities)
                .is_err()
        );
    }

    #[test]
    fn should_parse_table_list() {
        let tables = Table::parse_list("actuators, settings,,actuators,data_readings").unwrap();
        assert_eq!(
            tables,
            [Table::Actuators, Table::Settings, Table::DataReadings]
        );
    }

    #[test]
    fn should_reject_unknown_table() {
        assert_eq!(
            Table::parse_list("actuators,plants"),
            Err(ValidationError::UnknownTable("plants".to_string()))
        );
    }

    #[test]
    fn should_name_log_tables_after_their_records() {
        for table in Table::ALL {
            assert_eq!(table.as_str().parse::<Table>(), Ok(table));
        }
        assert_eq!(Table::GreenhouseServerState.to_string(), "greenhouse_server_state");
        assert_eq!(LogCapacities::default().for_table(Table::Settings), None);
    }
}
