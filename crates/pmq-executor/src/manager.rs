//! Order manager: batching, cancellation, and reconciliation.
//!
//! Sits between quote decisions and the exchange client. Placements go
//! out in chunks capped at the exchange batch limit, each order inside
//! a chunk succeeding or failing on its own. Cancels and snapshot
//! reconciliation keep the local store honest about what is resting.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use pmq_core::{FillEvent, PlaceOrderRequest, TokenId};

use crate::client::{DynExchangeClient, PlacedOrder};
use crate::config::ExecutorConfig;
use crate::error::ExecutorResult;
use crate::fee_cache::FeeCache;
use crate::order_store::{LocalOrder, OrderStore};

/// Result of a cancel sweep.
#[derive(Debug, Default)]
pub struct CancelOutcome {
    /// Orders confirmed cancelled, with their last local state. Buy
    /// orders in here carry reservations the caller must release.
    pub cancelled: Vec<LocalOrder>,
    /// Cancels that failed on the wire. The orders stay active locally
    /// and get retried on the next sweep or swept up by reconciliation.
    pub failed: usize,
}

pub struct OrderManager {
    client: DynExchangeClient,
    config: ExecutorConfig,
    fee_cache: FeeCache,
    store: parking_lot::Mutex<OrderStore>,
}

impl OrderManager {
    pub fn new(client: DynExchangeClient, config: ExecutorConfig) -> ExecutorResult<Self> {
        config.validate()?;
        let fee_cache = FeeCache::new(config.fee_cache_ttl_secs);
        Ok(Self {
            client,
            config,
            fee_cache,
            store: parking_lot::Mutex::new(OrderStore::new()),
        })
    }

    /// Maker fee rate for a token, cached with a TTL.
    pub async fn get_fee_rate(
        &self,
        token: &TokenId,
        now: DateTime<Utc>,
    ) -> ExecutorResult<Decimal> {
        if let Some(rate) = self.fee_cache.get(token, now) {
            return Ok(rate);
        }
        let rate = self.client.fetch_fee_rate(token.clone()).await?;
        self.fee_cache.insert(token.clone(), rate, now);
        debug!(token = %token, rate = %rate, "Fetched fee rate");
        Ok(rate)
    }

    /// Place a batch of orders, chunked to the exchange limit.
    ///
    /// Orders within a chunk are placed concurrently; chunks run in
    /// sequence. One rejected or failed order never blocks the others.
    /// Results come back in request order.
    pub async fn place_orders_batch(
        &self,
        requests: Vec<PlaceOrderRequest>,
        now: DateTime<Utc>,
    ) -> Vec<ExecutorResult<PlacedOrder>> {
        let mut results = Vec::with_capacity(requests.len());

        for chunk in requests.chunks(self.config.batch_size) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|request| self.client.place_order(request.clone()))
                .collect();
            let chunk_results = join_all(futures).await;

            let mut store = self.store.lock();
            for (request, result) in chunk.iter().zip(chunk_results) {
                match &result {
                    Ok(placed) => {
                        store.insert_placed(
                            placed.order_id.clone(),
                            request.cloid.clone(),
                            request.token.clone(),
                            request.side,
                            request.price,
                            request.size,
                            &placed.status,
                            now,
                        );
                        debug!(
                            order_id = %placed.order_id,
                            cloid = %request.cloid,
                            token = %request.token,
                            side = %request.side,
                            price = %request.price,
                            size = %request.size,
                            "Order placed"
                        );
                    }
                    Err(err) => {
                        warn!(
                            token = %request.token,
                            side = %request.side,
                            price = %request.price,
                            error = %err,
                            "Order placement failed"
                        );
                    }
                }
                results.push(result);
            }
        }

        results
    }

    /// Cancel every active order on one token.
    pub async fn cancel_token(&self, token: &TokenId) -> CancelOutcome {
        let targets: Vec<LocalOrder> = {
            let store = self.store.lock();
            store.active_for_token(token).into_iter().cloned().collect()
        };
        self.cancel_orders(targets).await
    }

    /// Cancel every active order across all tokens (halt path).
    pub async fn cancel_all(&self) -> CancelOutcome {
        let targets: Vec<LocalOrder> = {
            let store = self.store.lock();
            store.active_orders().into_iter().cloned().collect()
        };
        self.cancel_orders(targets).await
    }

    async fn cancel_orders(&self, targets: Vec<LocalOrder>) -> CancelOutcome {
        if targets.is_empty() {
            return CancelOutcome::default();
        }

        let futures: Vec<_> = targets
            .iter()
            .map(|order| self.client.cancel_order(order.order_id.clone()))
            .collect();
        let results = join_all(futures).await;

        let mut outcome = CancelOutcome::default();
        let mut store = self.store.lock();
        for (order, result) in targets.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    store.mark_cancelled(&order.order_id);
                    outcome.cancelled.push(order);
                }
                Err(err) => {
                    warn!(order_id = %order.order_id, error = %err, "Cancel failed");
                    outcome.failed += 1;
                }
            }
        }

        info!(
            cancelled = outcome.cancelled.len(),
            failed = outcome.failed,
            "Cancel sweep complete"
        );
        outcome
    }

    /// Pull the authoritative open-order snapshot and force the local
    /// store into line with it.
    pub async fn reconcile(&self, now: DateTime<Utc>) -> ExecutorResult<()> {
        let api_orders = self.client.fetch_open_orders().await?;
        self.store.lock().reconcile(&api_orders, now);
        Ok(())
    }

    /// Apply a fill from the user feed to the local order state.
    pub fn record_fill(&self, fill: &FillEvent) -> bool {
        let known = self.store.lock().record_fill(fill);
        if !known {
            warn!(order_id = %fill.order_id, "Fill for unknown order");
        }
        known
    }

    /// Active orders on one token, cloned out of the store.
    pub fn active_for_token(&self, token: &TokenId) -> Vec<LocalOrder> {
        self.store
            .lock()
            .active_for_token(token)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Active buy-side size on one token.
    pub fn active_buy_size(&self, token: &TokenId) -> Decimal {
        self.store.lock().active_buy_size(token)
    }

    pub fn active_order_count(&self) -> usize {
        self.store.lock().active_orders().len()
    }

    /// Drop terminal orders to bound memory.
    pub fn prune_terminal(&self) {
        self.store.lock().prune_terminal();
    }
}
