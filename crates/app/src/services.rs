//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod actuator_service;
pub mod settings_service;
pub mod telemetry_service;

pub use actuator_service::ActuatorService;
pub use settings_service::SettingsService;
pub use telemetry_service::TelemetryService;
