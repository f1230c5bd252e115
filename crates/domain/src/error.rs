//! Error taxonomy shared by every layer.
//!
//! Each failure crossing the core boundary is one of [`GreenhouseError`]'s
//! variants and carries an [`ErrorKind`] the transport maps to a status code.
//! Layers below the domain define their own typed errors and convert into
//! [`GreenhouseError`] via `From`.

use serde::Serialize;

/// Top-level error returned by every core operation.
#[derive(Debug, thiserror::Error)]
pub enum GreenhouseError {
    /// Malformed, missing or out-of-range input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The addressed record does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A write collided with existing data.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// The storage backend failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GreenhouseError {
    /// Classification used at the boundary.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Human-readable body returned across the boundary.
    ///
    /// Storage failures are reported generically; their detail stays in the
    /// logs.
    #[must_use]
    pub fn payload(&self) -> ErrorPayload {
        let message = match self {
            Self::Storage(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        ErrorPayload {
            kind: self.kind(),
            message,
        }
    }
}

/// Input rejected before any mutation took place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Required fields not met")]
    MissingFields,

    #[error("actuator name must not be empty")]
    EmptyName,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("data reading must be of type float")]
    NonNumericReading,

    #[error("'{0}' is not a recognised time of day")]
    InvalidTime(String),

    #[error(
        "Check data formats: temperature and soil moisture must be integers. Time formats must be commonly supported."
    )]
    InvalidFormat,

    #[error("soil moisture must be positive")]
    NegativeSoilMoisture,

    #[error("minimum temperature must be less than maximum temperature")]
    TemperatureRange,

    #[error("minimum soil moisture must be less than maximum soil moisture")]
    SoilMoistureRange,

    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    #[error("start_time and end_time must be integers")]
    InvalidTimeRange,

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("log capacity for '{0}' must be greater than zero")]
    ZeroCapacity(&'static str),
}

/// A lookup by key found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} '{id}' not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A write would violate a uniqueness rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} '{id}' already exists")]
pub struct ConflictError {
    pub entity: &'static str,
    pub id: String,
}

/// Boundary classification of a [`GreenhouseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// HTTP status the transport answers with.
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Validation => 400,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }
}

/// `{message}` body tagged with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    #[serde(skip)]
    pub kind: ErrorKind,
    pub message: String,
}

/// Classification of a successful completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A read (or an upsert returning its value).
    Ok,
    /// A record was appended.
    Created,
    /// A mutation with nothing to return.
    NoContent,
}

impl Completion {
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::NoContent => 204,
        }
    }
}
