//! Order management for the pmq quoting bot.
//!
//! The reconciliation and batching layer between quote decisions and
//! the exchange: TTL-cached fee rates, chunked concurrent batch
//! placement with per-order failure isolation, and local order
//! bookkeeping reconciled against authoritative exchange snapshots.

pub mod client;
pub mod config;
pub mod error;
pub mod fee_cache;
pub mod manager;
pub mod order_store;

pub use client::{
    ApiOrder, BoxFuture, DynExchangeClient, ExchangeClient, MockExchangeClient, PlacedOrder,
};
pub use config::ExecutorConfig;
pub use error::{ExecutorError, ExecutorResult};
pub use fee_cache::FeeCache;
pub use manager::{CancelOutcome, OrderManager};
pub use order_store::{translate_status, FillRecord, LocalOrder, OrderStore};
