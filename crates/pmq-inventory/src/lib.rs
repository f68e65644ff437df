//! Inventory management for the pmq quoting bot.
//!
//! Reconciles two asynchronously-arriving sources of position truth:
//! speculative real-time fills and the periodic authoritative position
//! snapshot. Exposure figures derived here are deliberately conservative;
//! unconfirmed buys always count against position limits.

pub mod config;
pub mod error;
pub mod manager;
pub mod position;

pub use config::InventoryConfig;
pub use error::{InventoryError, InventoryResult};
pub use manager::{InventoryLimits, InventoryManager, PositionSummary};
pub use position::{PendingFill, TrackedPosition};
