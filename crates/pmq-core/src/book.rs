//! Order book snapshots and two-sided quotes.
//!
//! The bot never runs a matching engine; it only consumes book snapshots
//! normalized by the feed adapters. A snapshot is usable for quoting only
//! when both sides are present and uncrossed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::{Price, Size, TokenId};

/// One price level of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub size: Size,
}

impl BookLevel {
    pub fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }
}

/// Current book state for one outcome token.
///
/// Invariant: usable only if both sides are non-empty and
/// `best_bid < best_ask`. Tick size is mutable mid-session; the exchange
/// can retune it while a market is live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookState {
    /// Outcome token this book belongs to.
    pub token: TokenId,
    /// Bid levels, best first (descending price).
    pub bids: Vec<BookLevel>,
    /// Ask levels, best first (ascending price).
    pub asks: Vec<BookLevel>,
    /// Minimum price increment.
    pub tick_size: Price,
    /// Last trade price, if any trade has printed.
    pub last_trade_price: Option<Price>,
    /// Timestamp when this snapshot was received.
    pub received_at: DateTime<Utc>,
}

impl OrderbookState {
    pub fn new(token: TokenId, bids: Vec<BookLevel>, asks: Vec<BookLevel>, tick_size: Price) -> Self {
        Self {
            token,
            bids,
            asks,
            tick_size,
            last_trade_price: None,
            received_at: Utc::now(),
        }
    }

    /// Best bid price, if the bid side is non-empty.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    /// Best ask price, if the ask side is non-empty.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// Size resting at the best bid.
    pub fn bid_depth(&self) -> Size {
        self.bids.first().map(|l| l.size).unwrap_or(Size::ZERO)
    }

    /// Size resting at the best ask.
    pub fn ask_depth(&self) -> Size {
        self.asks.first().map(|l| l.size).unwrap_or(Size::ZERO)
    }

    /// A book is valid when both sides are present and uncrossed.
    pub fn is_valid(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid < ask,
            _ => false,
        }
    }

    /// Mid price: (bid + ask) / 2. None if the book is invalid.
    pub fn mid(&self) -> Option<Price> {
        if !self.is_valid() {
            return None;
        }
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some(Price::new((bid.inner() + ask.inner()) / Decimal::TWO))
    }

    /// Spread expressed in whole ticks, rounded to nearest.
    ///
    /// None if the book is invalid or the tick size is zero.
    pub fn spread_ticks(&self) -> Option<i64> {
        if !self.is_valid() || self.tick_size.is_zero() {
            return None;
        }
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        ((ask.inner() - bid.inner()) / self.tick_size.inner())
            .round()
            .to_i64()
    }

    /// Age of this snapshot in milliseconds.
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.received_at).num_milliseconds()
    }
}

/// A two-sided resting quote.
///
/// Invariant: `0 < bid_price < ask_price < 1`. The bid size may be zero
/// when the buy side is suppressed; the quote is still considered live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub token: TokenId,
    pub bid_price: Price,
    pub bid_size: Size,
    pub ask_price: Price,
    pub ask_size: Size,
}

impl Quote {
    pub fn new(token: TokenId, bid_price: Price, bid_size: Size, ask_price: Price, ask_size: Size) -> Self {
        Self {
            token,
            bid_price,
            bid_size,
            ask_price,
            ask_size,
        }
    }

    /// Check the price invariant: `0 < bid < ask < 1`.
    pub fn is_valid(&self) -> bool {
        self.bid_price.inner() > Decimal::ZERO
            && self.bid_price < self.ask_price
            && self.ask_price.inner() < Decimal::ONE
    }

    /// Implied mid of this quote.
    pub fn mid(&self) -> Price {
        Price::new((self.bid_price.inner() + self.ask_price.inner()) / Decimal::TWO)
    }

    /// Whether the buy side has been suppressed (size zeroed).
    pub fn buy_suppressed(&self) -> bool {
        self.bid_size.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn token() -> TokenId {
        TokenId::from("tok")
    }

    fn level(price: Decimal, size: Decimal) -> BookLevel {
        BookLevel::new(Price::new(price), Size::new(size))
    }

    #[test]
    fn test_valid_book() {
        let book = OrderbookState::new(
            token(),
            vec![level(dec!(0.49), dec!(100))],
            vec![level(dec!(0.51), dec!(80))],
            Price::new(dec!(0.01)),
        );
        assert!(book.is_valid());
        assert_eq!(book.mid().unwrap().inner(), dec!(0.50));
        assert_eq!(book.spread_ticks(), Some(2));
    }

    #[test]
    fn test_crossed_book_invalid() {
        let book = OrderbookState::new(
            token(),
            vec![level(dec!(0.52), dec!(100))],
            vec![level(dec!(0.51), dec!(80))],
            Price::new(dec!(0.01)),
        );
        assert!(!book.is_valid());
        assert!(book.mid().is_none());
        assert!(book.spread_ticks().is_none());
    }

    #[test]
    fn test_empty_side_invalid() {
        let book = OrderbookState::new(
            token(),
            vec![],
            vec![level(dec!(0.51), dec!(80))],
            Price::new(dec!(0.01)),
        );
        assert!(!book.is_valid());
        assert_eq!(book.bid_depth(), Size::ZERO);
        assert_eq!(book.ask_depth(), Size::new(dec!(80)));
    }

    #[test]
    fn test_quote_invariant() {
        let good = Quote::new(
            token(),
            Price::new(dec!(0.49)),
            Size::new(dec!(10)),
            Price::new(dec!(0.51)),
            Size::new(dec!(10)),
        );
        assert!(good.is_valid());
        assert!(!good.buy_suppressed());

        let crossed = Quote::new(
            token(),
            Price::new(dec!(0.52)),
            Size::new(dec!(10)),
            Price::new(dec!(0.51)),
            Size::new(dec!(10)),
        );
        assert!(!crossed.is_valid());

        let out_of_range = Quote::new(
            token(),
            Price::new(dec!(0.98)),
            Size::new(dec!(10)),
            Price::new(dec!(1.00)),
            Size::new(dec!(10)),
        );
        assert!(!out_of_range.is_valid());
    }

    #[test]
    fn test_suppressed_quote_still_valid() {
        let quote = Quote::new(
            token(),
            Price::new(dec!(0.49)),
            Size::ZERO,
            Price::new(dec!(0.51)),
            Size::new(dec!(10)),
        );
        assert!(quote.is_valid());
        assert!(quote.buy_suppressed());
    }
}
