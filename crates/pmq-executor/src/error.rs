//! Error types for pmq-executor.
//!
//! Network failures are transient and stay local to the single order
//! or fetch that hit them; they are surfaced as structured results,
//! never propagated as panics into the quoting path.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// Transient network failure on a single operation.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Unknown order: {0}")]
    UnknownOrder(String),
}

pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;
