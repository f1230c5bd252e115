//! # greenhouse-domain
//!
//! Pure domain model for the greenhouse controller store.
//!
//! ## Responsibilities
//! - Foundational types: error taxonomy, timestamps, query windows
//! - Time-of-day codec for schedules (`HH:MM` ↔ seconds since midnight)
//! - Sensor unit normalization and battery health classification
//! - Log records: actuator transitions, sensor readings, heartbeats
//! - Actuators and the outcome of a state transition
//! - Settings validation
//! - The provisioning plan (actuator inventory, default settings, log capacities)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod log;
pub mod query;
pub mod time;
pub mod time_of_day;

pub mod actuator;
pub mod heartbeat;
pub mod provision;
pub mod reading;
pub mod settings;
