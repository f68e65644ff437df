//! Inventory configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, InventoryResult};

/// Inventory limits and reconciliation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Maximum position per market in shares.
    #[serde(default = "default_max_position_per_market")]
    pub max_position_per_market: Decimal,

    /// Maximum confirmed liability per market in USDC.
    #[serde(default = "default_max_liability_per_market")]
    pub max_liability_per_market_usdc: Decimal,

    /// Maximum total confirmed liability across all tokens in USDC.
    #[serde(default = "default_max_total_liability")]
    pub max_total_liability_usdc: Decimal,

    /// Skew factor per share of effective inventory.
    #[serde(default = "default_inventory_skew_coefficient")]
    pub inventory_skew_coefficient: Decimal,

    /// Age after which an unconfirmed sell fill is force-removed.
    /// Sells age out quickly; expiring one only makes limits stricter.
    #[serde(default = "default_sell_fill_max_age_secs")]
    pub sell_fill_max_age_secs: i64,

    /// Hard cap on unconfirmed buy fill age. Buys are held far longer
    /// than sells so unconfirmed exposure cannot be used to bypass
    /// position limits, while still bounding memory growth.
    #[serde(default = "default_buy_fill_max_age_secs")]
    pub buy_fill_max_age_secs: i64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_position_per_market: default_max_position_per_market(),
            max_liability_per_market_usdc: default_max_liability_per_market(),
            max_total_liability_usdc: default_max_total_liability(),
            inventory_skew_coefficient: default_inventory_skew_coefficient(),
            sell_fill_max_age_secs: default_sell_fill_max_age_secs(),
            buy_fill_max_age_secs: default_buy_fill_max_age_secs(),
        }
    }
}

impl InventoryConfig {
    /// Validate the configuration, collecting every violation.
    pub fn validate(&self) -> InventoryResult<()> {
        let mut violations = Vec::new();

        if self.max_position_per_market <= Decimal::ZERO {
            violations.push("max_position_per_market must be positive".to_string());
        }
        if self.max_liability_per_market_usdc <= Decimal::ZERO {
            violations.push("max_liability_per_market_usdc must be positive".to_string());
        }
        if self.max_total_liability_usdc < self.max_liability_per_market_usdc {
            violations.push(
                "max_total_liability_usdc must be >= max_liability_per_market_usdc".to_string(),
            );
        }
        if self.inventory_skew_coefficient < Decimal::ZERO {
            violations.push("inventory_skew_coefficient must be non-negative".to_string());
        }
        if self.sell_fill_max_age_secs <= 0 {
            violations.push("sell_fill_max_age_secs must be positive".to_string());
        }
        if self.buy_fill_max_age_secs < self.sell_fill_max_age_secs {
            violations.push("buy_fill_max_age_secs must be >= sell_fill_max_age_secs".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(InventoryError::InvalidConfig(violations))
        }
    }
}

fn default_max_position_per_market() -> Decimal {
    Decimal::new(100, 0)
}
fn default_max_liability_per_market() -> Decimal {
    Decimal::new(50, 0)
}
fn default_max_total_liability() -> Decimal {
    Decimal::new(500, 0)
}
fn default_inventory_skew_coefficient() -> Decimal {
    Decimal::new(2, 2) // 0.02
}
fn default_sell_fill_max_age_secs() -> i64 {
    30
}
fn default_buy_fill_max_age_secs() -> i64 {
    300
}
