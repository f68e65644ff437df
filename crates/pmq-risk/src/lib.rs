//! Circuit-breaker risk supervision for the pmq quoting bot.
//!
//! The risk manager is the sole authority empowered to halt order flow.
//! It owns per-market drawdown state and the global circuit breaker,
//! and returns its side effects as values; nothing here touches the
//! network.

pub mod config;
pub mod error;
pub mod manager;
pub mod state;

pub use config::RiskConfig;
pub use error::{RiskError, RiskResult};
pub use manager::{RiskEffect, RiskManager};
pub use state::{CircuitState, HaltReason, MarketRiskDetail, MarketRiskState, RiskStatus};
