//! Control settings: the single authoritative configuration record.
//!
//! [`SettingsInput`] is the submitted form with every field optional;
//! [`SettingsInput::validate`] turns it into canonical [`Settings`] (schedules
//! in seconds since midnight, sorted) or reports the first rule it breaks.
//! [`SettingsView`] is the display form with schedules as `HH:MM`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::time::Timestamp;
use crate::time_of_day::{TimeOfDay, decode};

/// Dot-atom local part, hostname-style labels in the domain.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("email pattern is a valid regex")
});

/// Whether `address` is a syntactically valid email address.
#[must_use]
pub fn is_valid_email(address: &str) -> bool {
    EMAIL.is_match(address)
}

/// A `min`/`max` threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    pub min: i64,
    pub max: i64,
}

/// Daily lights-on window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightSchedule {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

/// Canonical, validated settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "is_manual_mode")]
    pub manual_mode: bool,
    pub temperature: Threshold,
    pub soil_moisture: Threshold,
    pub lights: LightSchedule,
    pub watering_times: Vec<TimeOfDay>,
    pub error_flush_times: Vec<TimeOfDay>,
    pub email_addresses: Vec<String>,
}

impl Settings {
    /// Display form of these settings.
    #[must_use]
    pub fn view(&self) -> SettingsView {
        let times = |list: &[TimeOfDay]| -> Vec<String> {
            list.iter().map(ToString::to_string).collect()
        };
        SettingsView {
            is_manual_mode: self.manual_mode,
            temperature: self.temperature.into(),
            soil_moisture: self.soil_moisture.into(),
            lights: LightsView {
                start_time: decode(Some(self.lights.start_time.seconds())),
                end_time: decode(Some(self.lights.end_time.seconds())),
            },
            watering_times: times(&self.watering_times),
            error_flush_times: times(&self.error_flush_times),
            email_addresses: self.email_addresses.clone(),
        }
    }
}

/// Settings as persisted, with the instant they were last replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSettings {
    pub settings: Settings,
    pub updated_at: Timestamp,
}

/// Settings as shown to clients.
///
/// The [`Default`] value is what is returned before any settings exist:
/// manual mode off, no thresholds, blank light times, empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsView {
    pub is_manual_mode: bool,
    pub temperature: ThresholdView,
    pub soil_moisture: ThresholdView,
    pub lights: LightsView,
    pub watering_times: Vec<String>,
    pub error_flush_times: Vec<String>,
    pub email_addresses: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdView {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl From<Threshold> for ThresholdView {
    fn from(value: Threshold) -> Self {
        Self {
            min: Some(value.min),
            max: Some(value.max),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightsView {
    pub start_time: String,
    pub end_time: String,
}

/// Settings as submitted for an upsert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsInput {
    #[serde(default, rename = "is_manual_mode", alias = "manual_mode")]
    pub manual_mode: bool,
    pub temperature: Option<ThresholdInput>,
    pub soil_moisture: Option<ThresholdInput>,
    pub lights: Option<LightsInput>,
    pub watering_times: Option<Vec<String>>,
    pub error_flush_times: Option<Vec<String>>,
    pub email_addresses: Option<Vec<String>>,
}

/// Threshold bounds as submitted: integers, integral floats or integer strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdInput {
    pub min: Option<Value>,
    pub max: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightsInput {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl SettingsInput {
    /// Validate into canonical [`Settings`], stopping at the first violation.
    ///
    /// Rules, in order: thresholds are integers; every time parses; soil
    /// moisture bounds are non-negative; `temperature.min < max`;
    /// `soil_moisture.min < max`; every email address is valid. A missing
    /// address list counts as empty.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] of the first rule that fails.
    pub fn validate(self) -> Result<Settings, ValidationError> {
        let temperature = threshold(
            self.temperature.as_ref(),
            ["temperature", "temperature.min", "temperature.max"],
        )?;
        let soil_moisture = threshold(
            self.soil_moisture.as_ref(),
            ["soil_moisture", "soil_moisture.min", "soil_moisture.max"],
        )?;

        let lights = self.lights.ok_or(ValidationError::MissingField("lights"))?;
        let lights = LightSchedule {
            start_time: time(lights.start_time.as_deref(), "lights.start_time")?,
            end_time: time(lights.end_time.as_deref(), "lights.end_time")?,
        };
        let mut watering_times = times(self.watering_times, "watering_times")?;
        let mut error_flush_times = times(self.error_flush_times, "error_flush_times")?;

        if soil_moisture.min < 0 || soil_moisture.max < 0 {
            return Err(ValidationError::NegativeSoilMoisture);
        }
        if temperature.min >= temperature.max {
            return Err(ValidationError::TemperatureRange);
        }
        if soil_moisture.min >= soil_moisture.max {
            return Err(ValidationError::SoilMoistureRange);
        }

        let email_addresses = self.email_addresses.unwrap_or_default();
        if let Some(invalid) = email_addresses.iter().find(|addr| !is_valid_email(addr)) {
            return Err(ValidationError::InvalidEmail(invalid.clone()));
        }

        watering_times.sort();
        error_flush_times.sort();

        Ok(Settings {
            manual_mode: self.manual_mode,
            temperature,
            soil_moisture,
            lights,
            watering_times,
            error_flush_times,
            email_addresses,
        })
    }
}

fn threshold(
    input: Option<&ThresholdInput>,
    [group, min_field, max_field]: [&'static str; 3],
) -> Result<Threshold, ValidationError> {
    let input = input.ok_or(ValidationError::MissingField(group))?;
    let bound = |value: Option<&Value>, field| {
        value
            .ok_or(ValidationError::MissingField(field))
            .and_then(|v| integer(v).ok_or(ValidationError::InvalidFormat))
    };
    Ok(Threshold {
        min: bound(input.min.as_ref(), min_field)?,
        max: bound(input.max.as_ref(), max_field)?,
    })
}

/// Integers pass; finite floats are truncated toward zero; strings must hold
/// an integer.
#[allow(clippy::cast_possible_truncation)]
fn integer(value: &Value) -> Option<i64> {
    const LIMIT: f64 = 9.2e18;
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && f.abs() < LIMIT)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn time(text: Option<&str>, field: &'static str) -> Result<TimeOfDay, ValidationError> {
    text.ok_or(ValidationError::MissingField(field))?
        .parse()
        .map_err(|_| ValidationError::InvalidFormat)
}

fn times(list: Option<Vec<String>>, field: &'static str) -> Result<Vec<TimeOfDay>, ValidationError> {
    list.ok_or(ValidationError::MissingField(field))?
        .iter()
        .map(|text| time(Some(text.as_str()), field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_input() -> SettingsInput {
        serde_json::from_value(json!({
            "is_manual_mode": true,
            "temperature": {"min": 65, "max": 85},
            "soil_moisture": {"min": "30", "max": 70},
            "lights": {"start_time": "06:00", "end_time": "8:30 pm"},
            "watering_times": ["14:00", "09:00"],
            "error_flush_times": ["23:15", "03:00", "12:00"],
            "email_addresses": ["grower@example.com"]
        }))
        .unwrap()
    }

    #[test]
    fn should_validate_complete_input() {
        let settings = valid_input().validate().unwrap();
        assert!(settings.manual_mode);
        assert_eq!(settings.temperature, Threshold { min: 65, max: 85 });
        assert_eq!(settings.soil_moisture, Threshold { min: 30, max: 70 });
        assert_eq!(settings.lights.start_time, TimeOfDay::from_hm(6, 0));
        assert_eq!(settings.lights.end_time, TimeOfDay::from_hm(20, 30));
        assert_eq!(settings.email_addresses, ["grower@example.com"]);
    }

    #[test]
    fn should_sort_schedules_ascending() {
        let view = valid_input().validate().unwrap().view();
        assert_eq!(view.watering_times, ["09:00", "14:00"]);
        assert_eq!(view.error_flush_times, ["03:00", "12:00", "23:15"]);
    }

    #[test]
    fn should_reject_inverted_temperature_range() {
        let mut input = valid_input();
        input.temperature = Some(ThresholdInput {
            min: Some(json!(80)),
            max: Some(json!(70)),
        });
        assert_eq!(input.validate(), Err(ValidationError::TemperatureRange));
    }

    #[test]
    fn should_reject_equal_soil_bounds() {
        let mut input = valid_input();
        input.soil_moisture = Some(ThresholdInput {
            min: Some(json!(40)),
            max: Some(json!(40)),
        });
        assert_eq!(input.validate(), Err(ValidationError::SoilMoistureRange));
    }

    #[test]
    fn should_reject_negative_soil_before_ordering_checks() {
        let mut input = valid_input();
        input.soil_moisture = Some(ThresholdInput {
            min: Some(json!(-5)),
            max: Some(json!(-10)),
        });
        input.temperature = Some(ThresholdInput {
            min: Some(json!(90)),
            max: Some(json!(10)),
        });
        assert_eq!(input.validate(), Err(ValidationError::NegativeSoilMoisture));
    }

    #[test]
    fn should_reject_non_integer_thresholds_first() {
        let mut input = valid_input();
        input.temperature = Some(ThresholdInput {
            min: Some(json!("warm")),
            max: Some(json!(70)),
        });
        input.lights = Some(LightsInput {
            start_time: Some("never".to_string()),
            end_time: Some("08:00".to_string()),
        });
        assert_eq!(input.validate(), Err(ValidationError::InvalidFormat));
    }

    #[test]
    fn should_truncate_float_thresholds() {
        let mut input = valid_input();
        input.temperature = Some(ThresholdInput {
            min: Some(json!(60.9)),
            max: Some(json!(-0.5)),
        });
        // 60 < 0 fails ordering, proving both parsed
        assert_eq!(input.validate(), Err(ValidationError::TemperatureRange));
    }

    #[test]
    fn should_reject_unparsable_schedule_time() {
        let mut input = valid_input();
        input.watering_times = Some(vec!["09:00".to_string(), "lunchtime".to_string()]);
        assert_eq!(input.validate(), Err(ValidationError::InvalidFormat));
    }

    #[test]
    fn should_report_missing_fields() {
        let mut input = valid_input();
        input.soil_moisture = None;
        assert_eq!(
            input.validate(),
            Err(ValidationError::MissingField("soil_moisture"))
        );

        let mut input = valid_input();
        input.lights = Some(LightsInput {
            start_time: Some("06:00".to_string()),
            end_time: None,
        });
        assert_eq!(
            input.validate(),
            Err(ValidationError::MissingField("lights.end_time"))
        );

        let mut input = valid_input();
        input.error_flush_times = None;
        assert_eq!(
            input.validate(),
            Err(ValidationError::MissingField("error_flush_times"))
        );
    }

    #[test]
    fn should_default_missing_emails_to_empty() {
        let mut input = valid_input();
        input.email_addresses = None;
        assert!(input.validate().unwrap().email_addresses.is_empty());
    }

    #[test]
    fn should_report_first_invalid_email() {
        let mut input = valid_input();
        input.email_addresses = Some(vec![
            "ok@example.com".to_string(),
            "not-an-address".to_string(),
            "also bad@".to_string(),
        ]);
        assert_eq!(
            input.validate(),
            Err(ValidationError::InvalidEmail("not-an-address".to_string()))
        );
    }

    #[test]
    fn should_recognise_email_syntax() {
        assert!(is_valid_email("a.b+tag@greenhouse.example.org"));
        assert!(is_valid_email("root@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user.@example.com"));
        assert!(!is_valid_email("user@-example.com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn should_accept_manual_mode_alias() {
        let input: SettingsInput = serde_json::from_value(json!({"manual_mode": true})).unwrap();
        assert!(input.manual_mode);
    }

    #[test]
    fn should_render_empty_default_view() {
        let view = SettingsView::default();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            json!({
                "is_manual_mode": false,
                "temperature": {"min": null, "max": null},
                "soil_moisture": {"min": null, "max": null},
                "lights": {"start_time": "", "end_time": ""},
                "watering_times": [],
                "error_flush_times": [],
                "email_addresses": []
            })
        );
    }

    #[test]
    fn should_store_times_as_seconds() {
        let settings = valid_input().validate().unwrap();
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["lights"]["start_time"], json!(21_600));
        assert_eq!(json["watering_times"], json!([32_400, 50_400]));
    }
}
