//! Circuit-breaker state types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use pmq_core::TokenId;

/// Circuit-breaker state.
///
/// `Normal → Warning → Halted → Recovering → Normal`. Warning never
/// downgrades an existing Halted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitState {
    Normal,
    Warning,
    Halted,
    Recovering,
}

impl CircuitState {
    /// Position-limit multiplier applied to per-market limits and
    /// order sizes.
    pub fn position_limit_multiplier(&self) -> Decimal {
        match self {
            Self::Normal => Decimal::ONE,
            Self::Warning => Decimal::new(5, 1),     // 0.5
            Self::Recovering => Decimal::new(25, 2), // 0.25
            Self::Halted => Decimal::ZERO,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
            Self::Halted => write!(f, "halted"),
            Self::Recovering => write!(f, "recovering"),
        }
    }
}

/// Why the breaker halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    GlobalDrawdown,
    ConsecutiveErrors,
    UserWsDisconnect,
    /// Unresolved feed gap: cleared only by explicit resolution, never
    /// by the timed recovery alone.
    WsGapUnresolved,
    Manual,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GlobalDrawdown => write!(f, "GLOBAL_DRAWDOWN"),
            Self::ConsecutiveErrors => write!(f, "CONSECUTIVE_ERRORS"),
            Self::UserWsDisconnect => write!(f, "USER_WS_DISCONNECT"),
            Self::WsGapUnresolved => write!(f, "WS_GAP_UNRESOLVED"),
            Self::Manual => write!(f, "MANUAL"),
        }
    }
}

/// Per-market risk tracking.
#[derive(Debug, Clone)]
pub struct MarketRiskState {
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    /// High-water mark of total PnL.
    pub peak_pnl: Decimal,
    pub drawdown: Decimal,
    pub last_feed_update: Option<DateTime<Utc>>,
    pub stale: bool,
    /// Placement halted for this market only.
    pub halted: bool,
}

impl Default for MarketRiskState {
    fn default() -> Self {
        Self {
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            peak_pnl: Decimal::ZERO,
            drawdown: Decimal::ZERO,
            last_feed_update: None,
            stale: false,
            halted: false,
        }
    }
}

impl MarketRiskState {
    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl + self.unrealized_pnl
    }
}

/// Per-market slice of the status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRiskDetail {
    pub token: TokenId,
    pub total_pnl: Decimal,
    pub peak_pnl: Decimal,
    pub drawdown: Decimal,
    pub stale: bool,
    pub halted: bool,
}

/// Full inspectable breaker status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskStatus {
    pub state: CircuitState,
    pub halt_reason: Option<HaltReason>,
    pub halted_at: Option<DateTime<Utc>>,
    pub recovering_since: Option<DateTime<Utc>>,
    pub global_pnl: Decimal,
    pub global_peak_pnl: Decimal,
    pub global_drawdown: Decimal,
    pub consecutive_errors: u32,
    pub hourly_errors: usize,
    pub markets: Vec<MarketRiskDetail>,
}
