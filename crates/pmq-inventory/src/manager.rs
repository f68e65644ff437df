//! Inventory manager: the single owner of position state.
//!
//! Two data paths write here concurrently in the live system (the user
//! feed and the quoting loop); callers are expected to wrap the manager
//! in a per-process lock. No other component reads these maps directly.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use pmq_core::{FillEvent, OrderSide, PositionSnapshot, TokenId};

use crate::config::InventoryConfig;
use crate::error::InventoryResult;
use crate::position::{PendingFill, TrackedPosition};

/// Bound on the per-token replay-dedup set. When exceeded the set is
/// cleared; ids that old are long past both age-out windows.
const RECENT_TRADE_IDS_CAP: usize = 1000;

/// Buy/sell permission for a token, recomputed on demand.
#[derive(Debug, Clone)]
pub struct InventoryLimits {
    pub can_buy: bool,
    pub can_sell: bool,
    /// Human-readable reasons for any denial.
    pub reasons: Vec<String>,
}

/// Point-in-time view of one token's position, for status queries.
#[derive(Debug, Clone)]
pub struct PositionSummary {
    pub token: TokenId,
    pub confirmed_size: Decimal,
    pub effective_size: Decimal,
    pub liability: Decimal,
    pub pending_fill_count: usize,
    pub pending_buy_orders: Decimal,
    pub realized_pnl: Decimal,
    pub total_fees_paid: Decimal,
}

/// Manages positions across all quoted tokens.
#[derive(Debug)]
pub struct InventoryManager {
    config: InventoryConfig,
    positions: HashMap<TokenId, TrackedPosition>,
}

impl InventoryManager {
    /// Fails fast on an invalid configuration.
    pub fn new(config: InventoryConfig) -> InventoryResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            positions: HashMap::new(),
        })
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Apply a fill from the user feed.
    ///
    /// Idempotent under replay: a fill whose trade id has already been
    /// applied is ignored, even after a snapshot absorbed it or age-out
    /// removed it. Returns true if the fill was applied.
    ///
    /// Sell fills against a positive confirmed position realize PnL at
    /// `(fill_price - confirmed_avg) * min(fill_size, confirmed_size)`.
    /// Buy fills release an equal amount of reserved buy-order capacity,
    /// since the order that produced them no longer holds it.
    pub fn update_from_fill(&mut self, fill: &FillEvent) -> bool {
        let pos = self.positions.entry(fill.token.clone()).or_default();
        let trade_id = fill.dedup_id();

        if pos.recent_trade_ids.contains(&trade_id) {
            trace!(token = %fill.token, trade_id = %trade_id, "Duplicate fill ignored");
            return false;
        }
        pos.recent_trade_ids.insert(trade_id.clone());
        if pos.recent_trade_ids.len() > RECENT_TRADE_IDS_CAP {
            warn!(
                token = %fill.token,
                size = pos.recent_trade_ids.len(),
                "Clearing recent trade id set (cap exceeded)"
            );
            pos.recent_trade_ids.clear();
            pos.recent_trade_ids.insert(trade_id.clone());
        }

        let size = fill.size.inner();

        if fill.side == OrderSide::Sell && pos.confirmed_size > Decimal::ZERO {
            let closed = size.min(pos.confirmed_size);
            let pnl = (fill.price.inner() - pos.confirmed_avg_price.inner()) * closed;
            pos.realized_pnl += pnl;
            debug!(token = %fill.token, pnl = %pnl, "Realized PnL on sell fill");
        }

        pos.total_fees_paid += fill.fee;

        pos.pending_fills.insert(
            trade_id.clone(),
            PendingFill {
                trade_id,
                side: fill.side,
                size,
                price: fill.price,
                ts: fill.ts,
            },
        );

        if fill.side == OrderSide::Buy {
            pos.pending_buy_orders = (pos.pending_buy_orders - size).max(Decimal::ZERO);
        }

        true
    }

    /// Authoritative position sync.
    ///
    /// The delta between the snapshot and the old confirmed size is the
    /// amount of pending flow the exchange has absorbed. Pending fills
    /// whose direction matches the delta's sign are consumed oldest-first;
    /// whatever survives is then subjected to the age-out policy.
    pub fn set_position(&mut self, snapshot: &PositionSnapshot) {
        let pos = self.positions.entry(snapshot.token.clone()).or_default();
        let new_size = snapshot.size.inner();
        let absorbed = new_size - pos.confirmed_size;

        if !absorbed.is_zero() {
            Self::absorb_pending(pos, absorbed);
        }

        Self::age_out_pending(
            pos,
            &snapshot.token,
            self.config.sell_fill_max_age_secs,
            self.config.buy_fill_max_age_secs,
        );

        pos.confirmed_size = new_size;
        pos.confirmed_avg_price = snapshot.avg_entry_price;
        pos.confirmed_at = Utc::now();

        debug!(
            token = %snapshot.token,
            confirmed_size = %pos.confirmed_size,
            pending = pos.pending_fills.len(),
            "Position synced from snapshot"
        );
    }

    /// Consume `absorbed` from direction-matched pending fills, oldest first.
    fn absorb_pending(pos: &mut TrackedPosition, absorbed: Decimal) {
        let matched_side = if absorbed > Decimal::ZERO {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        let mut remaining = absorbed.abs();

        let mut ordered: Vec<(String, chrono::DateTime<Utc>)> = pos
            .pending_fills
            .iter()
            .filter(|(_, f)| f.side == matched_side)
            .map(|(id, f)| (id.clone(), f.ts))
            .collect();
        ordered.sort_by_key(|(_, ts)| *ts);

        for (id, _) in ordered {
            if remaining.is_zero() {
                break;
            }
            let fill = match pos.pending_fills.get_mut(&id) {
                Some(f) => f,
                None => continue,
            };
            let take = fill.size.min(remaining);
            fill.size -= take;
            remaining -= take;
            if fill.size.is_zero() {
                pos.pending_fills.remove(&id);
            }
        }

        if !remaining.is_zero() {
            // Snapshot moved further than our pending flow explains.
            warn!(
                unexplained = %remaining,
                side = %matched_side,
                "Snapshot delta exceeds pending fills; trusting snapshot"
            );
        }
    }

    /// Force-remove pending fills by age. Sells expire quickly; buys are
    /// held up to a hard cap so unconfirmed exposure keeps counting
    /// against limits.
    fn age_out_pending(
        pos: &mut TrackedPosition,
        token: &TokenId,
        sell_max_age_secs: i64,
        buy_max_age_secs: i64,
    ) {
        let now = Utc::now();
        let sell_cutoff = now - Duration::seconds(sell_max_age_secs);
        let buy_cutoff = now - Duration::seconds(buy_max_age_secs);

        let before = pos.pending_fills.len();
        pos.pending_fills.retain(|_, f| match f.side {
            OrderSide::Sell => f.ts > sell_cutoff,
            OrderSide::Buy => f.ts > buy_cutoff,
        });

        let removed = before - pos.pending_fills.len();
        if removed > 0 {
            warn!(
                token = %token,
                removed,
                "Aged out pending fills never confirmed by snapshot"
            );
        }
    }

    /// Compute buy/sell permission for a token.
    ///
    /// `limit_scale` is the risk manager's position-limit multiplier; it
    /// scales the position limit and both liability ceilings. Permissions
    /// are recomputed from scratch on every call, never cached.
    pub fn check_limits(&self, token: &TokenId, limit_scale: Decimal) -> InventoryLimits {
        let pos = self.positions.get(token);
        let conservative = pos.map(|p| p.conservative_exposure()).unwrap_or(Decimal::ZERO);
        let liability = pos.map(|p| p.liability()).unwrap_or(Decimal::ZERO);
        let effective = pos.map(|p| p.effective_size()).unwrap_or(Decimal::ZERO);
        let total_liability = self.total_confirmed_liability();

        let max_position = self.config.max_position_per_market * limit_scale;
        let max_liability = self.config.max_liability_per_market_usdc * limit_scale;
        let max_total = self.config.max_total_liability_usdc * limit_scale;

        let mut reasons = Vec::new();
        let mut can_buy = true;

        if conservative >= max_position {
            can_buy = false;
            reasons.push(format!(
                "conservative exposure {conservative} >= max position {max_position}"
            ));
        }
        if liability >= max_liability {
            can_buy = false;
            reasons.push(format!(
                "market liability {liability} >= limit {max_liability}"
            ));
        }
        if total_liability >= max_total {
            can_buy = false;
            reasons.push(format!(
                "total liability {total_liability} >= limit {max_total}"
            ));
        }

        let can_sell = effective > Decimal::ZERO;
        if !can_sell {
            reasons.push(format!("effective size {effective} <= 0, nothing to sell"));
        }

        InventoryLimits {
            can_buy,
            can_sell,
            reasons,
        }
    }

    /// Clip a target order size to what limits allow.
    ///
    /// Sells are clipped to the effective position; buys to the remaining
    /// conservative headroom under the (scaled) position limit.
    pub fn get_adjusted_order_size(
        &self,
        token: &TokenId,
        side: OrderSide,
        target: Decimal,
        limit_scale: Decimal,
    ) -> Decimal {
        let pos = self.positions.get(token);
        match side {
            OrderSide::Sell => {
                let effective = pos.map(|p| p.effective_size()).unwrap_or(Decimal::ZERO);
                target.min(effective.max(Decimal::ZERO))
            }
            OrderSide::Buy => {
                let conservative =
                    pos.map(|p| p.conservative_exposure()).unwrap_or(Decimal::ZERO);
                let headroom =
                    self.config.max_position_per_market * limit_scale - conservative;
                target.min(headroom.max(Decimal::ZERO))
            }
        }
    }

    /// Reserve buy capacity for an order about to be placed.
    pub fn reserve_pending_buy(&mut self, token: &TokenId, size: Decimal) {
        let pos = self.positions.entry(token.clone()).or_default();
        pos.pending_buy_orders += size;
    }

    /// Release previously reserved buy capacity (order cancelled or filled).
    pub fn release_pending_buy(&mut self, token: &TokenId, size: Decimal) {
        if let Some(pos) = self.positions.get_mut(token) {
            pos.pending_buy_orders = (pos.pending_buy_orders - size).max(Decimal::ZERO);
        }
    }

    /// Drop the whole buy reservation for a token (all orders cancelled).
    pub fn clear_pending_buys(&mut self, token: &TokenId) {
        if let Some(pos) = self.positions.get_mut(token) {
            pos.pending_buy_orders = Decimal::ZERO;
        }
    }

    /// Discard all pending fills for a token, trusting the snapshot.
    ///
    /// Used after a feed disconnect or gap where pending state can no
    /// longer be trusted.
    pub fn force_reconcile(&mut self, token: &TokenId) {
        if let Some(pos) = self.positions.get_mut(token) {
            let dropped = pos.pending_fills.len();
            pos.pending_fills.clear();
            if dropped > 0 {
                warn!(token = %token, dropped, "Force-reconciled: dropped pending fills");
            }
        }
    }

    /// Price skew: `coefficient * effective_size`.
    pub fn calculate_skew_factor(&self, token: &TokenId) -> Decimal {
        self.config.inventory_skew_coefficient * self.effective_size(token)
    }

    pub fn effective_size(&self, token: &TokenId) -> Decimal {
        self.positions
            .get(token)
            .map(|p| p.effective_size())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn confirmed_size(&self, token: &TokenId) -> Decimal {
        self.positions
            .get(token)
            .map(|p| p.confirmed_size)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn position(&self, token: &TokenId) -> Option<&TrackedPosition> {
        self.positions.get(token)
    }

    /// Confirmed liability summed across all tokens.
    pub fn total_confirmed_liability(&self) -> Decimal {
        self.positions.values().map(|p| p.liability()).sum()
    }

    pub fn total_realized_pnl(&self) -> Decimal {
        self.positions.values().map(|p| p.realized_pnl).sum()
    }

    pub fn total_fees_paid(&self) -> Decimal {
        self.positions.values().map(|p| p.total_fees_paid).sum()
    }

    /// Status view of one token.
    pub fn summary(&self, token: &TokenId) -> PositionSummary {
        let pos = self.positions.get(token);
        PositionSummary {
            token: token.clone(),
            confirmed_size: pos.map(|p| p.confirmed_size).unwrap_or(Decimal::ZERO),
            effective_size: pos.map(|p| p.effective_size()).unwrap_or(Decimal::ZERO),
            liability: pos.map(|p| p.liability()).unwrap_or(Decimal::ZERO),
            pending_fill_count: pos.map(|p| p.pending_fills.len()).unwrap_or(0),
            pending_buy_orders: pos.map(|p| p.pending_buy_orders).unwrap_or(Decimal::ZERO),
            realized_pnl: pos.map(|p| p.realized_pnl).unwrap_or(Decimal::ZERO),
            total_fees_paid: pos.map(|p| p.total_fees_paid).unwrap_or(Decimal::ZERO),
        }
    }

    /// Iterate all tracked tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &TokenId> {
        self.positions.keys()
    }
}
