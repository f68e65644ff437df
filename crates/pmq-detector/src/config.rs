//! Momentum detector configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, DetectorResult};

/// Trigger thresholds and cooldown tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Price delta (in ticks) inside the window that counts as momentum.
    #[serde(default = "default_momentum_threshold_ticks")]
    pub momentum_threshold_ticks: i64,

    /// Rolling window over trade prints, in milliseconds.
    #[serde(default = "default_momentum_window_ms")]
    pub momentum_window_ms: i64,

    /// Quoting cooldown after a trigger, in milliseconds.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: i64,

    /// Fractional top-of-book depth loss that counts as a sweep.
    /// 0.5 means a trigger when less than half the depth survives.
    #[serde(default = "default_sweep_depth_threshold")]
    pub sweep_depth_threshold: Decimal,

    /// Cap on retained trade prints per token.
    #[serde(default = "default_max_trade_history")]
    pub max_trade_history: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            momentum_threshold_ticks: default_momentum_threshold_ticks(),
            momentum_window_ms: default_momentum_window_ms(),
            cooldown_ms: default_cooldown_ms(),
            sweep_depth_threshold: default_sweep_depth_threshold(),
            max_trade_history: default_max_trade_history(),
        }
    }
}

impl DetectorConfig {
    /// Validate the configuration, collecting every violation.
    pub fn validate(&self) -> DetectorResult<()> {
        let mut violations = Vec::new();

        if self.momentum_threshold_ticks < 1 {
            violations.push("momentum_threshold_ticks must be at least 1".to_string());
        }
        if self.momentum_window_ms <= 0 {
            violations.push("momentum_window_ms must be positive".to_string());
        }
        if self.cooldown_ms <= 0 {
            violations.push("cooldown_ms must be positive".to_string());
        }
        if self.sweep_depth_threshold <= Decimal::ZERO || self.sweep_depth_threshold >= Decimal::ONE
        {
            violations.push("sweep_depth_threshold must be strictly between 0 and 1".to_string());
        }
        if self.max_trade_history == 0 {
            violations.push("max_trade_history must be positive".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(DetectorError::InvalidConfig(violations))
        }
    }
}

fn default_momentum_threshold_ticks() -> i64 {
    3
}
fn default_momentum_window_ms() -> i64 {
    500
}
fn default_cooldown_ms() -> i64 {
    2000
}
fn default_sweep_depth_threshold() -> Decimal {
    Decimal::new(5, 1) // 0.5
}
fn default_max_trade_history() -> usize {
    100
}
