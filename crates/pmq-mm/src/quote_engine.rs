//! Quote decision pipeline.
//!
//! `decide_quote` is a pure function over the book, inventory, momentum
//! cooldown flag, and the previously placed quote. Step order is
//! load-bearing: cooldown/validity short-circuit before any pricing
//! math, skew runs before clamping so skew-induced crossings get
//! corrected, and buy-side suppression is evaluated on the final
//! clamped prices.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use pmq_core::{OrderbookState, Price, Quote, Size};

use crate::config::QuoteConfig;

/// Outcome of one quote decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteDecision {
    /// Replace the resting quote with this one.
    Place(Quote),
    /// Leave the resting quote as-is.
    Keep,
    /// Pull both sides and stand down.
    CancelAll,
}

/// Decide what to do with the quote on one token.
///
/// `inventory` is the effective position in shares (signed); positive
/// inventory skews both prices down, biasing toward selling.
pub fn decide_quote(
    book: &OrderbookState,
    inventory: Decimal,
    in_cooldown: bool,
    previous_quote: Option<&Quote>,
    config: &QuoteConfig,
) -> QuoteDecision {
    // 1. Momentum cooldown: stand down entirely.
    if in_cooldown {
        debug!(token = %book.token, "Momentum cooldown, pulling quote");
        return QuoteDecision::CancelAll;
    }

    // 2. Unusable book: crossed, one-sided, or zero tick.
    if !book.is_valid() || book.tick_size.is_zero() {
        debug!(token = %book.token, "Book unusable, pulling quote");
        return QuoteDecision::CancelAll;
    }
    let (raw_bid, raw_ask, mid) = match (book.best_bid(), book.best_ask(), book.mid()) {
        (Some(b), Some(a), Some(m)) => (b.inner(), a.inner(), m.inner()),
        _ => return QuoteDecision::CancelAll,
    };

    // 3. Spread gate.
    let spread_ticks = match book.spread_ticks() {
        Some(t) => t,
        None => return QuoteDecision::CancelAll,
    };
    if spread_ticks < config.min_spread_ticks_to_quote {
        debug!(token = %book.token, spread_ticks, "Spread too narrow to quote");
        return QuoteDecision::CancelAll;
    }

    let tick = book.tick_size.inner();

    // 4. Base prices at the touch, stepped inward when the spread is
    //    wide enough to improve profitably.
    let offset = Decimal::from(config.quote_offset_ticks) * tick;
    let mut bid = raw_bid - offset;
    let mut ask = raw_ask + offset;
    if spread_ticks >= config.improve_when_spread_ticks {
        bid += tick;
        ask -= tick;
    }

    // 5. Inventory skew, same shift on both sides.
    let skew_ticks = (config.inventory_skew_coefficient * inventory)
        .round()
        .to_i64()
        .unwrap_or(0);
    let skew = Decimal::from(skew_ticks) * tick;
    bid -= skew;
    ask -= skew;

    // 6. Clamp. Cross-fix first, then range bounds, then fall back to
    //    the raw touch if the result is still unusable.
    if bid >= ask {
        if skew_ticks >= 0 {
            ask = bid + tick;
        } else {
            bid = ask - tick;
        }
    }
    bid = bid.max(tick);
    ask = ask.min(Decimal::ONE - tick);
    if bid >= ask {
        bid = raw_bid;
        ask = raw_ask;
    }

    // 7. Buy-side suppression on the final clamped bid. The ask stays
    //    live; only the bid size is zeroed.
    let bid_too_high = bid > config.max_buy_price
        || bid > mid * (Decimal::ONE + config.max_bid_above_mid_pct);
    let bid_size = if bid_too_high {
        Size::ZERO
    } else {
        Size::new(config.quote_size)
    };

    let candidate = Quote::new(
        book.token.clone(),
        Price::new(bid),
        bid_size,
        Price::new(ask),
        Size::new(config.quote_size),
    );

    // 8. Hysteresis against the previously placed quote.
    match previous_quote {
        None => QuoteDecision::Place(candidate),
        Some(prev) => {
            let mid_moved = Price::new(mid)
                .ticks_from(prev.mid(), book.tick_size)
                .abs();
            if mid_moved >= config.mid_move_force_place_ticks {
                return QuoteDecision::Place(candidate);
            }

            let bid_delta = candidate
                .bid_price
                .ticks_from(prev.bid_price, book.tick_size)
                .abs();
            let ask_delta = candidate
                .ask_price
                .ticks_from(prev.ask_price, book.tick_size)
                .abs();
            if bid_delta >= config.refresh_threshold_ticks
                || ask_delta >= config.refresh_threshold_ticks
            {
                QuoteDecision::Place(candidate)
            } else {
                QuoteDecision::Keep
            }
        }
    }
}
