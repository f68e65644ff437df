//! Risk manager configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

/// Circuit-breaker thresholds and timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Per-market drawdown (peak PnL minus current PnL) that halts
    /// placement on that market only, in USDC.
    #[serde(default = "default_max_drawdown_per_market")]
    pub max_drawdown_per_market_usdc: Decimal,

    /// Global drawdown that halts everything, in USDC.
    #[serde(default = "default_max_drawdown_global")]
    pub max_drawdown_global_usdc: Decimal,

    /// Consecutive failed operations that trigger a halt.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    /// Errors inside any rolling hour that trigger a halt.
    #[serde(default = "default_max_hourly_errors")]
    pub max_hourly_errors: usize,

    /// Feed silence (per market) that flips the breaker to warning.
    #[serde(default = "default_stale_feed_timeout_secs")]
    pub stale_feed_timeout_secs: i64,

    /// Time spent in recovering before returning to normal.
    #[serde(default = "default_recovery_secs")]
    pub circuit_breaker_recovery_secs: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_drawdown_per_market_usdc: default_max_drawdown_per_market(),
            max_drawdown_global_usdc: default_max_drawdown_global(),
            max_consecutive_errors: default_max_consecutive_errors(),
            max_hourly_errors: default_max_hourly_errors(),
            stale_feed_timeout_secs: default_stale_feed_timeout_secs(),
            circuit_breaker_recovery_secs: default_recovery_secs(),
        }
    }
}

impl RiskConfig {
    /// Validate the configuration, collecting every violation.
    pub fn validate(&self) -> RiskResult<()> {
        let mut violations = Vec::new();

        if self.max_drawdown_per_market_usdc <= Decimal::ZERO {
            violations.push("max_drawdown_per_market_usdc must be positive".to_string());
        }
        if self.max_drawdown_global_usdc < self.max_drawdown_per_market_usdc {
            violations.push(
                "max_drawdown_global_usdc must be >= max_drawdown_per_market_usdc".to_string(),
            );
        }
        if self.max_consecutive_errors == 0 {
            violations.push("max_consecutive_errors must be positive".to_string());
        }
        if self.max_hourly_errors == 0 {
            violations.push("max_hourly_errors must be positive".to_string());
        }
        if self.stale_feed_timeout_secs <= 0 {
            violations.push("stale_feed_timeout_secs must be positive".to_string());
        }
        if self.circuit_breaker_recovery_secs <= 0 {
            violations.push("circuit_breaker_recovery_secs must be positive".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(RiskError::InvalidConfig(violations))
        }
    }
}

fn default_max_drawdown_per_market() -> Decimal {
    Decimal::new(20, 0)
}
fn default_max_drawdown_global() -> Decimal {
    Decimal::new(100, 0)
}
fn default_max_consecutive_errors() -> u32 {
    5
}
fn default_max_hourly_errors() -> usize {
    20
}
fn default_stale_feed_timeout_secs() -> i64 {
    30
}
fn default_recovery_secs() -> i64 {
    60
}
