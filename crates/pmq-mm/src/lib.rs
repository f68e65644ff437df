//! Quote pricing for the pmq quoting bot.
//!
//! The decision function is pure and synchronous; it never touches the
//! network or any shared map. The caller supplies the book, the current
//! inventory, the momentum cooldown flag, and the previously placed
//! quote, and gets back a place/keep/cancel decision.

pub mod config;
pub mod error;
pub mod quote_engine;

pub use config::QuoteConfig;
pub use error::{MmError, MmResult};
pub use quote_engine::{decide_quote, QuoteDecision};
