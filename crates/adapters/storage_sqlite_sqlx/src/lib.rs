//! # greenhouse-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the port traits defined in `greenhouse-app::ports`
//! - Manage the `SQLite` connection pool lifecycle through [`Database`]
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Re-initialise tables from a provisioning plan
//!
//! ## Dependency rule
//! Depends on `greenhouse-app` (for port traits) and `greenhouse-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod actuator_repo;
pub mod bounded_log;
pub mod error;
pub mod pool;
pub mod provision;
pub mod settings_repo;

pub use actuator_repo::SqliteActuatorRepository;
pub use bounded_log::{LogTable, SqliteBoundedLog};
pub use error::StorageError;
pub use pool::{Config, Database};
pub use provision::SqliteProvisioner;
pub use settings_repo::SqliteSettingsRepository;
