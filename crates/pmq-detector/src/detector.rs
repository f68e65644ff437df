//! Momentum detector implementation.
//!
//! Per-token state machine: `idle` or `cooldown(until)`. Two triggers
//! enter cooldown: a windowed price move measured in ticks, and a
//! top-of-book depth sweep. Expiry is checked lazily when the quoting
//! loop asks; tokens are fully independent of each other.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use pmq_core::{OrderSide, OrderbookState, Price, Size, TokenId, TradeEvent};

use crate::config::DetectorConfig;
use crate::error::DetectorResult;
use crate::signal::{MomentumEvent, MomentumTrigger};

#[derive(Debug, Default)]
struct TokenMomentum {
    cooldown_until: Option<DateTime<Utc>>,
    /// Rolling trade prints, oldest first, bounded by config.
    trades: VecDeque<(DateTime<Utc>, Price)>,
    last_bid_depth: Option<Size>,
    last_ask_depth: Option<Size>,
}

/// Watches trades and book depth, producing per-token cooldowns.
#[derive(Debug)]
pub struct MomentumDetector {
    config: DetectorConfig,
    states: HashMap<TokenId, TokenMomentum>,
}

impl MomentumDetector {
    /// Fails fast on an invalid configuration.
    pub fn new(config: DetectorConfig) -> DetectorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            states: HashMap::new(),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Ingest a public trade print.
    ///
    /// Returns an event when this print moves the token from idle into
    /// cooldown. A trigger while already cooling extends the expiry
    /// silently.
    pub fn on_trade(&mut self, trade: &TradeEvent, tick_size: Price) -> Option<MomentumEvent> {
        let state = self.states.entry(trade.token.clone()).or_default();

        state.trades.push_back((trade.ts, trade.price));
        while state.trades.len() > self.config.max_trade_history {
            state.trades.pop_front();
        }

        if tick_size.is_zero() {
            return None;
        }

        let window_start = trade.ts - Duration::milliseconds(self.config.momentum_window_ms);
        let mut min: Option<Price> = None;
        let mut max: Option<Price> = None;
        for (ts, price) in state.trades.iter() {
            if *ts < window_start {
                continue;
            }
            min = Some(min.map_or(*price, |m| m.min(*price)));
            max = Some(max.map_or(*price, |m| m.max(*price)));
        }
        let (min, max) = match (min, max) {
            (Some(min), Some(max)) => (min, max),
            _ => return None,
        };

        let delta_ticks = max.ticks_from(min, tick_size);
        if delta_ticks < self.config.momentum_threshold_ticks {
            return None;
        }

        debug!(token = %trade.token, delta_ticks, "Momentum price move detected");
        Self::enter_cooldown(
            state,
            &trade.token,
            MomentumTrigger::PriceMove { delta_ticks },
            trade.ts,
            self.config.cooldown_ms,
        )
    }

    /// Ingest a book snapshot and check for a depth sweep.
    ///
    /// Compares top-of-book depth per side to the previous snapshot; a
    /// side that keeps less than `1 - sweep_depth_threshold` of its
    /// depth counts as swept.
    pub fn on_book_update(&mut self, book: &OrderbookState) -> Option<MomentumEvent> {
        let state = self.states.entry(book.token.clone()).or_default();

        let bid_depth = book.bid_depth();
        let ask_depth = book.ask_depth();
        let prev_bid = state.last_bid_depth.replace(bid_depth);
        let prev_ask = state.last_ask_depth.replace(ask_depth);

        let survive_floor = Decimal::ONE - self.config.sweep_depth_threshold;
        let swept = |old: Option<Size>, new: Size| -> Option<Decimal> {
            let old = old.filter(|d| d.is_positive())?;
            let ratio = new.inner() / old.inner();
            (ratio < survive_floor).then_some(ratio)
        };

        let (side, ratio) = if let Some(ratio) = swept(prev_bid, bid_depth) {
            (OrderSide::Buy, ratio)
        } else if let Some(ratio) = swept(prev_ask, ask_depth) {
            (OrderSide::Sell, ratio)
        } else {
            return None;
        };

        debug!(token = %book.token, %side, %ratio, "Depth sweep detected");
        Self::enter_cooldown(
            state,
            &book.token,
            MomentumTrigger::DepthSweep { side, ratio },
            book.received_at,
            self.config.cooldown_ms,
        )
    }

    /// Whether the token is currently in cooldown. Expired cooldowns
    /// are cleared on this read.
    pub fn is_in_cooldown(&mut self, token: &TokenId, now: DateTime<Utc>) -> bool {
        let Some(state) = self.states.get_mut(token) else {
            return false;
        };
        match state.cooldown_until {
            Some(until) if until > now => true,
            Some(_) => {
                state.cooldown_until = None;
                false
            }
            None => false,
        }
    }

    pub fn cooldown_until(&self, token: &TokenId) -> Option<DateTime<Utc>> {
        self.states.get(token).and_then(|s| s.cooldown_until)
    }

    /// Operator override: put a token into cooldown unconditionally.
    pub fn force_cooldown(
        &mut self,
        token: &TokenId,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> MomentumEvent {
        let state = self.states.entry(token.clone()).or_default();
        let until = now + duration;
        state.cooldown_until = Some(until);
        info!(token = %token, %until, "Forced cooldown");
        MomentumEvent {
            token: token.clone(),
            trigger: MomentumTrigger::Manual,
            cooldown_until: until,
        }
    }

    /// Operator override: clear any cooldown on a token.
    pub fn clear_cooldown(&mut self, token: &TokenId) {
        if let Some(state) = self.states.get_mut(token) {
            if state.cooldown_until.take().is_some() {
                info!(token = %token, "Cooldown cleared");
            }
        }
    }

    fn enter_cooldown(
        state: &mut TokenMomentum,
        token: &TokenId,
        trigger: MomentumTrigger,
        at: DateTime<Utc>,
        cooldown_ms: i64,
    ) -> Option<MomentumEvent> {
        let until = at + Duration::milliseconds(cooldown_ms);
        let already_cooling = state.cooldown_until.is_some_and(|u| u > at);
        state.cooldown_until = Some(state.cooldown_until.map_or(until, |u| u.max(until)));

        if already_cooling {
            return None;
        }
        info!(token = %token, ?trigger, %until, "Entering cooldown");
        Some(MomentumEvent {
            token: token.clone(),
            trigger,
            cooldown_until: until,
        })
    }
}
