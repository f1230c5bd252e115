//! Actuators (controllable devices with a boolean state) and their
//! state-transition records.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::log::LogRecord;
use crate::time::Timestamp;

/// Kind of device an actuator drives.
///
/// Variants are declared in the lexical order of their names so the derived
/// `Ord` agrees with sorting on the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKind {
    Fan,
    Heater,
    Lights,
    Water,
}

impl ActuatorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fan => "fan",
            Self::Heater => "heater",
            Self::Lights => "lights",
            Self::Water => "water",
        }
    }
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActuatorKind {
    type Err = UnknownActuatorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fan" => Ok(Self::Fan),
            "heater" => Ok(Self::Heater),
            "lights" => Ok(Self::Lights),
            "water" => Ok(Self::Water),
            other => Err(UnknownActuatorKind(other.to_string())),
        }
    }
}

/// Returned when a stored actuator type is not one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown actuator type '{0}'")]
pub struct UnknownActuatorKind(pub String);

/// A controllable device and its current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actuator {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActuatorKind,
    pub state: bool,
}

impl Actuator {
    /// A freshly provisioned actuator, switched off.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ActuatorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            state: false,
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    /// Listing order: type, then name.
    #[must_use]
    pub fn listing_order(a: &Self, b: &Self) -> Ordering {
        a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name))
    }
}

/// Audit record of an actuator changing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorTransition {
    pub name: String,
    pub to_state: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
}

impl LogRecord for ActuatorTransition {
    type Key = String;

    const LOG_NAME: &'static str = "actuators_state_log";

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn matches(&self, key: &Self::Key) -> bool {
        &self.name == key
    }

    fn canonical_order(a: &Self, b: &Self) -> Ordering {
        b.timestamp.cmp(&a.timestamp)
    }
}

/// Result of asking an actuator to move to a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The state changed and this record was logged.
    Applied(ActuatorTransition),
    /// The actuator was already in the requested state; nothing was written.
    Unchanged,
}

impl TransitionOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::from_millis;

    #[test]
    fn should_provision_actuator_switched_off() {
        let actuator = Actuator::new("fan01", ActuatorKind::Fan);
        assert!(!actuator.state);
        assert!(actuator.validate().is_ok());
    }

    #[test]
    fn should_reject_blank_name() {
        let actuator = Actuator::new("  ", ActuatorKind::Heater);
        assert_eq!(actuator.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn should_order_kinds_like_their_names() {
        let mut kinds = vec![
            ActuatorKind::Water,
            ActuatorKind::Lights,
            ActuatorKind::Heater,
            ActuatorKind::Fan,
        ];
        kinds.sort();
        let names: Vec<&str> = kinds.iter().map(|kind| kind.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn should_list_by_type_then_name() {
        let mut actuators = vec![
            Actuator::new("solenoid01", ActuatorKind::Water),
            Actuator::new("fan02", ActuatorKind::Fan),
            Actuator::new("bigfan", ActuatorKind::Fan),
            Actuator::new("heater01", ActuatorKind::Heater),
        ];
        actuators.sort_by(Actuator::listing_order);
        let names: Vec<&str> = actuators.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["bigfan", "fan02", "heater01", "solenoid01"]);
    }

    #[test]
    fn should_serialize_kind_under_type_key() {
        let json = serde_json::to_value(Actuator::new("lights01", ActuatorKind::Lights)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "lights01", "type": "lights", "state": false})
        );
    }

    #[test]
    fn should_parse_kind_from_str() {
        assert_eq!("water".parse::<ActuatorKind>(), Ok(ActuatorKind::Water));
        assert!("sprinkler".parse::<ActuatorKind>().is_err());
    }

    #[test]
    fn should_serialize_transition_timestamp_as_millis() {
        let transition = ActuatorTransition {
            name: "fan01".to_string(),
            to_state: true,
            timestamp: from_millis(1_700_000_000_123).unwrap(),
        };
        let json = serde_json::to_value(&transition).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "fan01", "to_state": true, "timestamp": 1_700_000_000_123_i64})
        );
    }

    #[test]
    fn should_order_transitions_newest_first() {
        let older = ActuatorTransition {
            name: "fan01".to_string(),
            to_state: true,
            timestamp: from_millis(1_000).unwrap(),
        };
        let newer = ActuatorTransition {
            timestamp: from_millis(2_000).unwrap(),
            ..older.clone()
        };
        assert_eq!(
            ActuatorTransition::canonical_order(&newer, &older),
            Ordering::Less
        );
        assert!(older.matches(&"fan01".to_string()));
        assert!(!older.matches(&"fan02".to_string()));
    }
}
