//! Exchange client trait for order execution.
//!
//! Provides a trait-based abstraction over the exchange REST/WS surface.
//! This allows for:
//! - Dependency injection for testing
//! - Separation of order bookkeeping from transport
//! - Future flexibility in transport implementation

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

use rust_decimal::Decimal;

use pmq_core::{PlaceOrderRequest, TokenId};

use crate::error::ExecutorResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Exchange acknowledgement for a single placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Exchange-assigned order id.
    pub order_id: String,
    /// Raw status string from the acknowledgement.
    pub status: String,
}

/// An open order as reported by the exchange snapshot endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiOrder {
    pub order_id: String,
    pub token: TokenId,
    pub side: pmq_core::OrderSide,
    pub price: pmq_core::Price,
    pub original_size: pmq_core::Size,
    pub remaining_size: pmq_core::Size,
    /// Raw status string. Translated locally; never matched on directly
    /// outside the order store.
    pub status: String,
}

/// Trait over the exchange order surface.
///
/// Methods take owned arguments so implementations can move them into
/// the returned future without lifetime gymnastics.
pub trait ExchangeClient: Send + Sync {
    /// Place a single resting order.
    fn place_order(&self, request: PlaceOrderRequest) -> BoxFuture<'_, ExecutorResult<PlacedOrder>>;

    /// Cancel a single order by exchange order id.
    fn cancel_order(&self, order_id: String) -> BoxFuture<'_, ExecutorResult<()>>;

    /// Fetch the current maker fee rate for a token.
    fn fetch_fee_rate(&self, token: TokenId) -> BoxFuture<'_, ExecutorResult<Decimal>>;

    /// Fetch the authoritative open-order snapshot.
    fn fetch_open_orders(&self) -> BoxFuture<'_, ExecutorResult<Vec<ApiOrder>>>;
}

/// Arc wrapper for ExchangeClient trait objects.
pub type DynExchangeClient = Arc<dyn ExchangeClient>;

/// Recorded call on the mock client, for verification.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Place(PlaceOrderRequest),
    Cancel(String),
    FetchFeeRate(TokenId),
    FetchOpenOrders,
}

/// Mock exchange client for testing.
///
/// Queued results are consumed in call order; an empty queue yields a
/// generic acknowledgement so tests only script what they care about.
#[derive(Debug)]
pub struct MockExchangeClient {
    calls: parking_lot::Mutex<Vec<RecordedCall>>,
    place_results: parking_lot::Mutex<VecDeque<ExecutorResult<PlacedOrder>>>,
    cancel_results: parking_lot::Mutex<VecDeque<ExecutorResult<()>>>,
    fee_rate: parking_lot::Mutex<ExecutorResult<Decimal>>,
    open_orders: parking_lot::Mutex<ExecutorResult<Vec<ApiOrder>>>,
    next_order_id: std::sync::atomic::AtomicU64,
}

impl Default for MockExchangeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchangeClient {
    pub fn new() -> Self {
        Self {
            calls: parking_lot::Mutex::new(Vec::new()),
            place_results: parking_lot::Mutex::new(VecDeque::new()),
            cancel_results: parking_lot::Mutex::new(VecDeque::new()),
            fee_rate: parking_lot::Mutex::new(Ok(Decimal::ZERO)),
            open_orders: parking_lot::Mutex::new(Ok(Vec::new())),
            next_order_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// Queue the result for the next unscripted place call.
    pub fn push_place_result(&self, result: ExecutorResult<PlacedOrder>) {
        self.place_results.lock().push_back(result);
    }

    /// Queue the result for the next unscripted cancel call.
    pub fn push_cancel_result(&self, result: ExecutorResult<()>) {
        self.cancel_results.lock().push_back(result);
    }

    pub fn set_fee_rate(&self, result: ExecutorResult<Decimal>) {
        *self.fee_rate.lock() = result;
    }

    pub fn set_open_orders(&self, result: ExecutorResult<Vec<ApiOrder>>) {
        *self.open_orders.lock() = result;
    }

    /// Get recorded calls.
    pub fn get_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn generated_order_id(&self) -> String {
        let n = self
            .next_order_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        format!("mock-{n}")
    }
}

impl ExchangeClient for MockExchangeClient {
    fn place_order(&self, request: PlaceOrderRequest) -> BoxFuture<'_, ExecutorResult<PlacedOrder>> {
        // Result is drawn synchronously so concurrent callers consume the
        // queue in registration order, not poll order.
        self.calls.lock().push(RecordedCall::Place(request));
        let result = self.place_results.lock().pop_front().unwrap_or_else(|| {
            Ok(PlacedOrder {
                order_id: self.generated_order_id(),
                status: "open".to_string(),
            })
        });
        Box::pin(async move { result })
    }

    fn cancel_order(&self, order_id: String) -> BoxFuture<'_, ExecutorResult<()>> {
        self.calls.lock().push(RecordedCall::Cancel(order_id));
        let result = self.cancel_results.lock().pop_front().unwrap_or(Ok(()));
        Box::pin(async move { result })
    }

    fn fetch_fee_rate(&self, token: TokenId) -> BoxFuture<'_, ExecutorResult<Decimal>> {
        self.calls.lock().push(RecordedCall::FetchFeeRate(token));
        let result = self.fee_rate.lock().clone();
        Box::pin(async move { result })
    }

    fn fetch_open_orders(&self) -> BoxFuture<'_, ExecutorResult<Vec<ApiOrder>>> {
        self.calls.lock().push(RecordedCall::FetchOpenOrders);
        let result = self.open_orders.lock().clone();
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmq_core::{OrderSide, Price, Size};
    use rust_decimal_macros::dec;

    use crate::error::ExecutorError;

    fn sample_request() -> PlaceOrderRequest {
        PlaceOrderRequest {
            token: TokenId::from("tok"),
            side: OrderSide::Buy,
            price: Price::new(dec!(0.48)),
            size: Size::new(dec!(10)),
            post_only: true,
            cloid: pmq_core::ClientOrderId::new(),
        }
    }

    #[tokio::test]
    async fn test_mock_records_place_calls() {
        let client = MockExchangeClient::new();

        let request = sample_request();
        let placed = client.place_order(request.clone()).await;
        assert!(placed.is_ok());
        assert_eq!(client.get_calls().len(), 1);
        assert_eq!(client.get_calls()[0], RecordedCall::Place(request));
    }

    #[tokio::test]
    async fn test_mock_returns_queued_results_in_order() {
        let client = MockExchangeClient::new();
        client.push_place_result(Err(ExecutorError::OrderRejected("post-only cross".into())));
        client.push_place_result(Ok(PlacedOrder {
            order_id: "x-2".into(),
            status: "open".into(),
        }));

        let first = client.place_order(sample_request()).await;
        let second = client.place_order(sample_request()).await;
        assert_eq!(
            first,
            Err(ExecutorError::OrderRejected("post-only cross".into()))
        );
        assert_eq!(second.map(|p| p.order_id), Ok("x-2".to_string()));
    }

    #[tokio::test]
    async fn test_mock_generates_distinct_order_ids() {
        let client = MockExchangeClient::new();
        let a = client.place_order(sample_request()).await.unwrap();
        let b = client.place_order(sample_request()).await.unwrap();
        assert_ne!(a.order_id, b.order_id);
    }

    #[tokio::test]
    async fn test_mock_fee_rate() {
        let client = MockExchangeClient::new();
        client.set_fee_rate(Ok(dec!(0.0015)));
        let rate = client.fetch_fee_rate(TokenId::from("tok")).await;
        assert_eq!(rate, Ok(dec!(0.0015)));
    }
}
