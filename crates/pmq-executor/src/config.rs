//! Order manager configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ExecutorError, ExecutorResult};

/// Exchange-imposed ceiling on orders per batch request.
pub const MAX_BATCH_SIZE: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Orders per concurrent placement group.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Fee-rate cache lifetime in seconds.
    #[serde(default = "default_fee_cache_ttl_secs")]
    pub fee_cache_ttl_secs: i64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            fee_cache_ttl_secs: default_fee_cache_ttl_secs(),
        }
    }
}

impl ExecutorConfig {
    /// Validate the configuration, collecting every violation.
    pub fn validate(&self) -> ExecutorResult<()> {
        let mut violations = Vec::new();

        if self.batch_size == 0 {
            violations.push("batch_size must be positive".to_string());
        }
        if self.batch_size > MAX_BATCH_SIZE {
            violations.push(format!("batch_size must be <= {MAX_BATCH_SIZE}"));
        }
        if self.fee_cache_ttl_secs <= 0 {
            violations.push("fee_cache_ttl_secs must be positive".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ExecutorError::InvalidConfig(violations))
        }
    }
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}
fn default_fee_cache_ttl_secs() -> i64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.batch_size, 15);
        assert_eq!(config.fee_cache_ttl_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ExecutorConfig = toml::from_str("batch_size = 10").unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.fee_cache_ttl_secs, 300);
    }

    #[test]
    fn test_validation_rejects_oversized_batch() {
        let config = ExecutorConfig {
            batch_size: 16,
            fee_cache_ttl_secs: 0,
        };
        match config.validate() {
            Err(ExecutorError::InvalidConfig(violations)) => assert_eq!(violations.len(), 2),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }
}
