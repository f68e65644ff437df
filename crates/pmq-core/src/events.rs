//! Normalized feed events and outbound exchange requests.
//!
//! The feed adapters translate raw exchange payloads into these fixed
//! tagged structs before anything reaches the core; the core never
//! inspects loose key/value payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BookLevel, ClientOrderId, OrderSide, OrderStatus, Price, Size, TokenId};

/// Full book snapshot from the market data feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEvent {
    pub token: TokenId,
    /// Bid levels, best first (descending price).
    pub bids: Vec<BookLevel>,
    /// Ask levels, best first (ascending price).
    pub asks: Vec<BookLevel>,
    pub tick_size: Price,
    pub last_trade_price: Option<Price>,
    pub ts: DateTime<Utc>,
}

/// A public trade print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub token: TokenId,
    pub price: Price,
    pub ts: DateTime<Utc>,
}

/// A fill on one of our orders, from the user feed.
///
/// Fills arrive speculatively ahead of the authoritative position
/// snapshot; the inventory manager holds them as pending until a
/// snapshot absorbs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    pub order_id: String,
    pub token: TokenId,
    pub side: OrderSide,
    pub price: Price,
    pub size: Size,
    pub fee: Decimal,
    /// Exchange trade id. Absent on some partial-fill payloads; the
    /// inventory manager synthesizes one to avoid collisions.
    pub trade_id: Option<String>,
    pub ts: DateTime<Utc>,
}

impl FillEvent {
    /// Trade id used for deduplication.
    ///
    /// When the exchange omits the id, synthesize one from order id,
    /// timestamp, and size so distinct partial fills never collide.
    pub fn dedup_id(&self) -> String {
        match &self.trade_id {
            Some(id) => id.clone(),
            None => format!("{}:{}:{}", self.order_id, self.ts.timestamp_millis(), self.size),
        }
    }
}

/// Order lifecycle update from the user feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: String,
    pub token: TokenId,
    pub side: OrderSide,
    pub price: Price,
    pub original_size: Size,
    pub remaining_size: Size,
    pub status: OrderStatus,
}

/// Periodic authoritative position sync from the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub token: TokenId,
    pub size: Size,
    pub avg_entry_price: Price,
}

/// Which feed channel disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectChannel {
    /// Public market-data feed (books, trades).
    Market,
    /// Private user feed (fills, order updates).
    User,
}

/// A feed disconnect notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectSignal {
    pub channel: DisconnectChannel,
}

/// Request to place a resting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub token: TokenId,
    pub side: OrderSide,
    pub price: Price,
    pub size: Size,
    /// Post-only orders must not immediately match (rebate eligibility).
    pub post_only: bool,
    /// Unique client order id, so a retried submission cannot place twice.
    pub cloid: ClientOrderId,
}

/// Cancel scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelRequest {
    /// Cancel a single order by exchange order id.
    Order(String),
    /// Cancel every open order on one token.
    Token(TokenId),
    /// Cancel everything (kill switch).
    All,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fill_dedup_id_uses_trade_id_when_present() {
        let fill = FillEvent {
            order_id: "o1".into(),
            token: TokenId::from("tok"),
            side: OrderSide::Buy,
            price: Price::new(dec!(0.5)),
            size: Size::new(dec!(10)),
            fee: dec!(0.01),
            trade_id: Some("t-42".into()),
            ts: Utc::now(),
        };
        assert_eq!(fill.dedup_id(), "t-42");
    }

    #[test]
    fn test_fill_dedup_id_synthesized_distinct_for_partials() {
        let ts = Utc::now();
        let fill = |size: Decimal| FillEvent {
            order_id: "o1".into(),
            token: TokenId::from("tok"),
            side: OrderSide::Buy,
            price: Price::new(dec!(0.5)),
            size: Size::new(size),
            fee: dec!(0),
            trade_id: None,
            ts,
        };
        // Two partials of the same order at the same millisecond differ by size.
        assert_ne!(fill(dec!(3)).dedup_id(), fill(dec!(7)).dedup_id());
    }
}
