//! Momentum trigger signal types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pmq_core::{OrderSide, TokenId};

/// What tripped the detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MomentumTrigger {
    /// Directional price move inside the rolling window.
    PriceMove {
        /// Window price range expressed in ticks.
        delta_ticks: i64,
    },
    /// Top-of-book depth on one side collapsed between two snapshots.
    DepthSweep {
        /// Side whose depth was swept.
        side: OrderSide,
        /// Surviving fraction of the previous depth.
        ratio: Decimal,
    },
    /// Operator override.
    Manual,
}

/// Emitted when a token enters cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumEvent {
    pub token: TokenId,
    pub trigger: MomentumTrigger,
    pub cooldown_until: DateTime<Utc>,
}
