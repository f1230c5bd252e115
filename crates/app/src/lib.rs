//! # greenhouse-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ActuatorRepository`: actuator inventory and atomic state transitions
//!   - `BoundedLog<T>`: fixed-capacity, time-indexed logs
//!   - `SettingsRepository`: the singleton settings record
//! - Define **driving/inbound ports** as use-case structs:
//!   - `ActuatorService`: list, get, transition, history
//!   - `TelemetryService`: record and query readings and heartbeats
//!   - `SettingsService`: get and upsert settings
//! - Orchestrate domain objects without knowing *how* persistence works
//!
//! ## Dependency rule
//! Depends on `greenhouse-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
