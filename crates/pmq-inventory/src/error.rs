//! Error types for pmq-inventory.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("Unknown token: {0}")]
    UnknownToken(String),
}

pub type InventoryResult<T> = std::result::Result<T, InventoryError>;
