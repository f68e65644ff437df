//! Per-token position state.
//!
//! A position has two layers: confirmed state from the authoritative
//! snapshot, and pending fills from the real-time user feed that the
//! snapshot has not yet absorbed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use pmq_core::{OrderSide, Price};

/// A fill received from the user feed, not yet confirmed by an
/// authoritative position snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFill {
    /// Dedup key (exchange trade id, or synthesized).
    pub trade_id: String,
    pub side: OrderSide,
    /// Remaining unabsorbed size. Shrinks as snapshots absorb it.
    pub size: Decimal,
    pub price: Price,
    pub ts: DateTime<Utc>,
}

/// Tracked position for a single outcome token.
#[derive(Debug, Clone)]
pub struct TrackedPosition {
    /// Size confirmed by the latest authoritative snapshot.
    pub confirmed_size: Decimal,
    /// Average entry price of the confirmed position.
    pub confirmed_avg_price: Price,
    /// When the confirmed state was last synced.
    pub confirmed_at: DateTime<Utc>,
    /// Unabsorbed fills, keyed by trade id. Reconciliation walks them
    /// oldest-first; the map itself carries no ordering.
    pub pending_fills: std::collections::HashMap<String, PendingFill>,
    /// Trade ids already applied, kept past absorption and age-out so a
    /// feed replay cannot re-apply a fill. Bounded by the manager.
    pub recent_trade_ids: std::collections::HashSet<String>,
    /// Buy capacity reserved by open orders, in shares. Order-level
    /// bookkeeping, distinct from fill-level pending state.
    pub pending_buy_orders: Decimal,
    /// Realized PnL in USDC.
    pub realized_pnl: Decimal,
    /// Total fees paid in USDC.
    pub total_fees_paid: Decimal,
}

impl Default for TrackedPosition {
    fn default() -> Self {
        Self {
            confirmed_size: Decimal::ZERO,
            confirmed_avg_price: Price::ZERO,
            confirmed_at: Utc::now(),
            pending_fills: std::collections::HashMap::new(),
            recent_trade_ids: std::collections::HashSet::new(),
            pending_buy_orders: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            total_fees_paid: Decimal::ZERO,
        }
    }
}

impl TrackedPosition {
    /// Sum of unconfirmed buy fills.
    pub fn pending_buy_total(&self) -> Decimal {
        self.pending_fills
            .values()
            .filter(|f| f.side == OrderSide::Buy)
            .map(|f| f.size)
            .sum()
    }

    /// Sum of unconfirmed sell fills.
    pub fn pending_sell_total(&self) -> Decimal {
        self.pending_fills
            .values()
            .filter(|f| f.side == OrderSide::Sell)
            .map(|f| f.size)
            .sum()
    }

    /// Best estimate of the live position:
    /// `confirmed + pending buys - pending sells`.
    pub fn effective_size(&self) -> Decimal {
        self.confirmed_size + self.pending_buy_total() - self.pending_sell_total()
    }

    /// Worst-case dollar loss if the token settles to zero.
    ///
    /// Uses only confirmed state; pending fills never move the risk
    /// ceiling upward before they are confirmed.
    pub fn liability(&self) -> Decimal {
        self.confirmed_size.abs() * self.confirmed_avg_price.inner()
    }

    /// Worst-case buy-side exposure:
    /// `confirmed + pending buy fills + reserved buy orders`.
    ///
    /// Pending sells are intentionally not netted; this bound prevents
    /// limit bypass when fills race ahead of the snapshot.
    pub fn conservative_exposure(&self) -> Decimal {
        self.confirmed_size + self.pending_buy_total() + self.pending_buy_orders
    }

    /// Pending fills sorted oldest-first, for reconciliation.
    pub fn pending_fills_oldest_first(&self) -> Vec<&PendingFill> {
        let mut fills: Vec<&PendingFill> = self.pending_fills.values().collect();
        fills.sort_by_key(|f| f.ts);
        fills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fill(id: &str, side: OrderSide, size: Decimal) -> PendingFill {
        PendingFill {
            trade_id: id.to_string(),
            side,
            size,
            price: Price::new(dec!(0.5)),
            ts: Utc::now(),
        }
    }

    #[test]
    fn test_effective_size_identity() {
        let mut pos = TrackedPosition {
            confirmed_size: dec!(10),
            ..Default::default()
        };
        pos.pending_fills
            .insert("b1".into(), fill("b1", OrderSide::Buy, dec!(5)));
        pos.pending_fills
            .insert("s1".into(), fill("s1", OrderSide::Sell, dec!(3)));

        assert_eq!(pos.pending_buy_total(), dec!(5));
        assert_eq!(pos.pending_sell_total(), dec!(3));
        assert_eq!(pos.effective_size(), dec!(12));
    }

    #[test]
    fn test_conservative_exposure_ignores_pending_sells() {
        let mut pos = TrackedPosition {
            confirmed_size: dec!(10),
            pending_buy_orders: dec!(4),
            ..Default::default()
        };
        pos.pending_fills
            .insert("s1".into(), fill("s1", OrderSide::Sell, dec!(8)));

        // Sells reduce effective size but never the conservative bound.
        assert_eq!(pos.effective_size(), dec!(2));
        assert_eq!(pos.conservative_exposure(), dec!(14));
        assert!(pos.conservative_exposure() >= pos.confirmed_size);
    }

    #[test]
    fn test_liability_uses_confirmed_only() {
        let mut pos = TrackedPosition {
            confirmed_size: dec!(20),
            confirmed_avg_price: Price::new(dec!(0.4)),
            ..Default::default()
        };
        pos.pending_fills
            .insert("b1".into(), fill("b1", OrderSide::Buy, dec!(100)));

        assert_eq!(pos.liability(), dec!(8));
    }
}
