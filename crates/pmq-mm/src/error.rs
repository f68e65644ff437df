//! Error types for pmq-mm.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MmError {
    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

pub type MmResult<T> = std::result::Result<T, MmError>;
