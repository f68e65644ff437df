//! Quote engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MmError, MmResult};

/// Pricing, hysteresis, and buy-side safety tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// Extra ticks outward from the base bid/ask on both sides.
    #[serde(default)]
    pub quote_offset_ticks: i64,

    /// Minimum book spread (in ticks) required to quote at all.
    #[serde(default = "default_min_spread_ticks_to_quote")]
    pub min_spread_ticks_to_quote: i64,

    /// Book spread (in ticks) at which we step one tick inside the
    /// touch on each side.
    #[serde(default = "default_improve_when_spread_ticks")]
    pub improve_when_spread_ticks: i64,

    /// Hysteresis band: re-place only when either side has moved at
    /// least this many ticks from the resting quote.
    #[serde(default = "default_refresh_threshold_ticks")]
    pub refresh_threshold_ticks: i64,

    /// Mid move (in ticks) that forces a re-place regardless of the
    /// per-side hysteresis band.
    #[serde(default = "default_mid_move_force_place_ticks")]
    pub mid_move_force_place_ticks: i64,

    /// Skew factor per share of effective inventory.
    #[serde(default = "default_inventory_skew_coefficient")]
    pub inventory_skew_coefficient: Decimal,

    /// Target size per quote side, in shares.
    #[serde(default = "default_quote_size")]
    pub quote_size: Decimal,

    /// Absolute ceiling on the bid price. Above this the buy side is
    /// suppressed (bid size zeroed, ask left live).
    #[serde(default = "default_max_buy_price")]
    pub max_buy_price: Decimal,

    /// Maximum bid premium over the book mid, as a fraction. Same
    /// suppression as `max_buy_price`.
    #[serde(default = "default_max_bid_above_mid_pct")]
    pub max_bid_above_mid_pct: Decimal,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            quote_offset_ticks: 0,
            min_spread_ticks_to_quote: default_min_spread_ticks_to_quote(),
            improve_when_spread_ticks: default_improve_when_spread_ticks(),
            refresh_threshold_ticks: default_refresh_threshold_ticks(),
            mid_move_force_place_ticks: default_mid_move_force_place_ticks(),
            inventory_skew_coefficient: default_inventory_skew_coefficient(),
            quote_size: default_quote_size(),
            max_buy_price: default_max_buy_price(),
            max_bid_above_mid_pct: default_max_bid_above_mid_pct(),
        }
    }
}

impl QuoteConfig {
    /// Validate the configuration, collecting every violation.
    pub fn validate(&self) -> MmResult<()> {
        let mut violations = Vec::new();

        if self.quote_offset_ticks < 0 {
            violations.push("quote_offset_ticks must be non-negative".to_string());
        }
        if self.min_spread_ticks_to_quote < 1 {
            violations.push("min_spread_ticks_to_quote must be at least 1".to_string());
        }
        if self.refresh_threshold_ticks < 1 {
            violations.push("refresh_threshold_ticks must be at least 1".to_string());
        }
        if self.mid_move_force_place_ticks < 1 {
            violations.push("mid_move_force_place_ticks must be at least 1".to_string());
        }
        if self.inventory_skew_coefficient < Decimal::ZERO {
            violations.push("inventory_skew_coefficient must be non-negative".to_string());
        }
        if self.quote_size <= Decimal::ZERO {
            violations.push("quote_size must be positive".to_string());
        }
        if self.max_buy_price <= Decimal::ZERO || self.max_buy_price >= Decimal::ONE {
            violations.push("max_buy_price must be strictly between 0 and 1".to_string());
        }
        if self.max_bid_above_mid_pct < Decimal::ZERO {
            violations.push("max_bid_above_mid_pct must be non-negative".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(MmError::InvalidConfig(violations))
        }
    }
}

fn default_min_spread_ticks_to_quote() -> i64 {
    2
}
fn default_improve_when_spread_ticks() -> i64 {
    4
}
fn default_refresh_threshold_ticks() -> i64 {
    2
}
fn default_mid_move_force_place_ticks() -> i64 {
    2
}
fn default_inventory_skew_coefficient() -> Decimal {
    Decimal::new(2, 2) // 0.02
}
fn default_quote_size() -> Decimal {
    Decimal::new(10, 0)
}
fn default_max_buy_price() -> Decimal {
    Decimal::new(99, 2) // 0.99
}
fn default_max_bid_above_mid_pct() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = QuoteConfig::default();
        assert_eq!(config.quote_offset_ticks, 0);
        assert_eq!(config.min_spread_ticks_to_quote, 2);
        assert_eq!(config.improve_when_spread_ticks, 4);
        assert_eq!(config.refresh_threshold_ticks, 2);
        assert_eq!(config.inventory_skew_coefficient, dec!(0.02));
        assert_eq!(config.quote_size, dec!(10));
        assert_eq!(config.max_buy_price, dec!(0.99));
        assert_eq!(config.max_bid_above_mid_pct, dec!(0.05));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serde_fills_defaults() {
        let toml_str = r#"
quote_size = "25"
"#;
        let config: QuoteConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.quote_size, dec!(25));
        assert_eq!(config.min_spread_ticks_to_quote, 2);
    }

    #[test]
    fn test_validation_collects_all_violations() {
        let config = QuoteConfig {
            quote_size: dec!(0),
            max_buy_price: dec!(1.5),
            refresh_threshold_ticks: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(MmError::InvalidConfig(violations)) => assert_eq!(violations.len(), 3),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }
}
