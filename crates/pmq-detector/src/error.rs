//! Error types for pmq-detector.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

pub type DetectorResult<T> = std::result::Result<T, DetectorError>;
