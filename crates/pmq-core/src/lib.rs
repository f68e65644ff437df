//! Core domain types for the pmq quoting bot.
//!
//! This crate provides fundamental types used throughout the system:
//! - `TokenId`: Unique identifier for an outcome token
//! - `Price`, `Size`: Precision-safe numeric types (prices live in (0, 1))
//! - `OrderbookState`, `Quote`: book snapshots and two-sided quotes
//! - Normalized feed events and outbound exchange requests

pub mod book;
pub mod decimal;
pub mod error;
pub mod events;
pub mod order;
pub mod token;

pub use book::{BookLevel, OrderbookState, Quote};
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use events::{
    BookEvent, CancelRequest, DisconnectChannel, DisconnectSignal, FillEvent, OrderEvent,
    PlaceOrderRequest, PositionSnapshot, TradeEvent,
};
pub use order::{ClientOrderId, OrderSide, OrderStatus};
pub use token::TokenId;
