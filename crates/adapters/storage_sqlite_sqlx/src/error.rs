//! Storage-specific error type wrapping sqlx errors.

use greenhouse_domain::error::GreenhouseError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to encode or decode a stored JSON value.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for GreenhouseError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = ?err, "storage failure");
        Self::Storage(Box::new(err))
    }
}

/// Wrap a value that read back from the database in an unusable shape.
pub(crate) fn decode_error(
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> sqlx::Error {
    sqlx::Error::Decode(err.into())
}
