//! Momentum detection for the pmq quoting bot.
//!
//! Watches public trades and book depth for adverse-selection signals:
//! a fast directional price move, or one side of the book getting swept.
//! Either puts the token into a short quoting cooldown. Cooldown expiry
//! is evaluated lazily on read; there are no timers.

pub mod config;
pub mod detector;
pub mod error;
pub mod signal;

pub use config::DetectorConfig;
pub use detector::MomentumDetector;
pub use error::{DetectorError, DetectorResult};
pub use signal::{MomentumEvent, MomentumTrigger};
