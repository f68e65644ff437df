//! Local order bookkeeping and exchange-snapshot reconciliation.
//!
//! The store is the local view of what should be resting on the book.
//! It is updated optimistically from placements and fills, and
//! periodically forced back into line with the authoritative
//! open-order snapshot from the exchange.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pmq_core::{ClientOrderId, FillEvent, OrderSide, OrderStatus, Price, Size, TokenId};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::client::ApiOrder;

/// Translate a raw exchange status string into the local lifecycle.
///
/// Unrecognized strings map to `Pending` rather than being dropped, so
/// a new status value from the exchange degrades to a cancel-and-replace
/// on the next refresh instead of a lost order.
pub fn translate_status(raw: &str) -> OrderStatus {
    match raw.to_ascii_lowercase().as_str() {
        "open" | "resting" | "live" => OrderStatus::Open,
        "pending" | "new" | "submitted" => OrderStatus::Pending,
        s if s.starts_with("partial") => OrderStatus::PartialFilled,
        "filled" | "matched" => OrderStatus::Filled,
        s if s.starts_with("cancel") => OrderStatus::Cancelled,
        "rejected" => OrderStatus::Rejected,
        other => {
            warn!(status = other, "Unrecognized order status, treating as pending");
            OrderStatus::Pending
        }
    }
}

/// One fill applied to a local order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillRecord {
    pub size: Size,
    pub price: Price,
    pub ts: DateTime<Utc>,
}

/// Locally-tracked order state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalOrder {
    pub order_id: String,
    /// Our client order id. None for orders adopted from a snapshot,
    /// which were not placed through this process.
    pub cloid: Option<ClientOrderId>,
    pub token: TokenId,
    pub side: OrderSide,
    pub price: Price,
    pub original_size: Size,
    pub remaining_size: Size,
    pub status: OrderStatus,
    pub fills: Vec<FillRecord>,
    pub placed_at: DateTime<Utc>,
}

impl LocalOrder {
    pub fn filled_size(&self) -> Decimal {
        self.fills.iter().map(|f| f.size.inner()).sum()
    }
}

/// Map of exchange order id to local order state.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: HashMap<String, LocalOrder>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly-acknowledged placement.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_placed(
        &mut self,
        order_id: String,
        cloid: ClientOrderId,
        token: TokenId,
        side: OrderSide,
        price: Price,
        size: Size,
        raw_status: &str,
        now: DateTime<Utc>,
    ) {
        let order = LocalOrder {
            order_id: order_id.clone(),
            cloid: Some(cloid),
            token,
            side,
            price,
            original_size: size,
            remaining_size: size,
            status: translate_status(raw_status),
            fills: Vec::new(),
            placed_at: now,
        };
        self.orders.insert(order_id, order);
    }

    /// Apply a fill from the user feed.
    ///
    /// Returns false when the fill references an order the store does
    /// not know; the caller decides whether that is worth a warning.
    pub fn record_fill(&mut self, fill: &FillEvent) -> bool {
        let Some(order) = self.orders.get_mut(&fill.order_id) else {
            return false;
        };
        order.fills.push(FillRecord {
            size: fill.size,
            price: fill.price,
            ts: fill.ts,
        });
        let remaining = (order.remaining_size.inner() - fill.size.inner()).max(Decimal::ZERO);
        order.remaining_size = Size::new(remaining);
        order.status = if remaining.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartialFilled
        };
        true
    }

    /// Mark an order cancelled after a confirmed cancel.
    pub fn mark_cancelled(&mut self, order_id: &str) {
        if let Some(order) = self.orders.get_mut(order_id) {
            order.status = OrderStatus::Cancelled;
        }
    }

    pub fn get(&self, order_id: &str) -> Option<&LocalOrder> {
        self.orders.get(order_id)
    }

    /// Orders still cancellable, across all tokens.
    pub fn active_orders(&self) -> Vec<&LocalOrder> {
        self.orders.values().filter(|o| o.status.is_active()).collect()
    }

    /// Active orders on one token.
    pub fn active_for_token(&self, token: &TokenId) -> Vec<&LocalOrder> {
        self.orders
            .values()
            .filter(|o| o.status.is_active() && &o.token == token)
            .collect()
    }

    /// Active buy-side size on one token, for exposure reservations.
    pub fn active_buy_size(&self, token: &TokenId) -> Decimal {
        self.orders
            .values()
            .filter(|o| o.status.is_active() && &o.token == token && o.side == OrderSide::Buy)
            .map(|o| o.remaining_size.inner())
            .sum()
    }

    /// Drop terminal orders to bound memory on long sessions.
    pub fn prune_terminal(&mut self) {
        self.orders.retain(|_, o| !o.status.is_terminal());
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Force the store into line with the exchange snapshot.
    ///
    /// The snapshot is authoritative: locally-active orders missing
    /// from it were cancelled or filled while we were not looking, and
    /// snapshot orders we have no record of are adopted so they can be
    /// cancelled through the normal path.
    pub fn reconcile(&mut self, api_orders: &[ApiOrder], now: DateTime<Utc>) {
        let mut seen: HashMap<&str, &ApiOrder> = HashMap::new();
        for api in api_orders {
            seen.insert(api.order_id.as_str(), api);
        }

        for order in self.orders.values_mut() {
            if !order.status.is_active() {
                continue;
            }
            match seen.get(order.order_id.as_str()) {
                Some(api) => {
                    order.remaining_size = api.remaining_size;
                    order.status = translate_status(&api.status);
                }
                None => {
                    warn!(
                        order_id = %order.order_id,
                        token = %order.token,
                        "Active order missing from exchange snapshot, marking cancelled"
                    );
                    order.status = OrderStatus::Cancelled;
                }
            }
        }

        for api in api_orders {
            if self.orders.contains_key(&api.order_id) {
                continue;
            }
            warn!(
                order_id = %api.order_id,
                token = %api.token,
                "Adopting unknown order from exchange snapshot"
            );
            self.orders.insert(
                api.order_id.clone(),
                LocalOrder {
                    order_id: api.order_id.clone(),
                    cloid: None,
                    token: api.token.clone(),
                    side: api.side,
                    price: api.price,
                    original_size: api.original_size,
                    remaining_size: api.remaining_size,
                    status: translate_status(&api.status),
                    fills: Vec::new(),
                    placed_at: now,
                },
            );
        }

        debug!(orders = self.orders.len(), "Reconciled against snapshot");
    }
}
