//! Error types for pmq-telemetry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Logging initialization failed: {0}")]
    InitFailed(String),
}

pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;
