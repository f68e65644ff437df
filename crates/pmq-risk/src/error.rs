//! Error types for pmq-risk.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

pub type RiskResult<T> = std::result::Result<T, RiskError>;
