//! Circuit-breaker risk manager.
//!
//! All inputs arrive as explicit method calls with an explicit clock;
//! all outputs leave as `RiskEffect` values. The orchestrator executes
//! the effects (notifying listeners, firing the kill switch through the
//! order manager); nothing here suspends.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use pmq_core::{DisconnectChannel, DisconnectSignal, TokenId};

use crate::config::RiskConfig;
use crate::error::RiskResult;
use crate::state::{CircuitState, HaltReason, MarketRiskDetail, MarketRiskState, RiskStatus};

/// Side effect the caller must execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskEffect {
    StateChanged {
        old: CircuitState,
        new: CircuitState,
        reason: Option<HaltReason>,
    },
    /// Cancel every open order, everywhere. Fire-and-forget.
    KillSwitch,
}

/// Once-only latch for the kill-switch side effect.
///
/// Armed again when the breaker leaves Halted, so a later halt fires a
/// fresh kill switch.
#[derive(Debug, Default)]
struct KillSwitchLatch {
    fired: AtomicBool,
}

impl KillSwitchLatch {
    /// Returns true exactly once until the next `arm()`.
    fn fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn arm(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }
}

/// Owns drawdown tracking and the circuit-breaker state machine.
#[derive(Debug)]
pub struct RiskManager {
    config: RiskConfig,
    state: CircuitState,
    halt_reason: Option<HaltReason>,
    halted_at: Option<DateTime<Utc>>,
    recovering_since: Option<DateTime<Utc>>,
    markets: HashMap<TokenId, MarketRiskState>,
    global_peak_pnl: Decimal,
    consecutive_errors: u32,
    /// Error timestamps inside the rolling hour, oldest first.
    hourly_errors: VecDeque<DateTime<Utc>>,
    /// Open feed gap; blocks recovery until explicitly resolved.
    data_gap_open: bool,
    kill_switch: KillSwitchLatch,
}

impl RiskManager {
    /// Fails fast on an invalid configuration.
    pub fn new(config: RiskConfig) -> RiskResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: CircuitState::Normal,
            halt_reason: None,
            halted_at: None,
            recovering_since: None,
            markets: HashMap::new(),
            global_peak_pnl: Decimal::ZERO,
            consecutive_errors: 0,
            hourly_errors: VecDeque::new(),
            data_gap_open: false,
            kill_switch: KillSwitchLatch::default(),
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halt_reason
    }

    pub fn is_halted(&self) -> bool {
        self.state == CircuitState::Halted
    }

    /// Scaling applied to position limits, liability ceilings, and
    /// order sizes.
    pub fn position_limit_multiplier(&self) -> Decimal {
        self.state.position_limit_multiplier()
    }

    /// Whether orders may be placed on this market right now.
    pub fn can_place(&self, token: &TokenId) -> bool {
        if self.state == CircuitState::Halted {
            return false;
        }
        !self.markets.get(token).map(|m| m.halted).unwrap_or(false)
    }

    pub fn market_halted(&self, token: &TokenId) -> bool {
        self.markets.get(token).map(|m| m.halted).unwrap_or(false)
    }

    /// Update a market's PnL and re-evaluate both drawdown scopes.
    ///
    /// A per-market drawdown breach halts only that market's placement.
    /// A global breach trips the breaker and fires the kill switch.
    pub fn update_market_pnl(
        &mut self,
        token: &TokenId,
        realized: Decimal,
        unrealized: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<RiskEffect> {
        let market = self.markets.entry(token.clone()).or_default();
        market.realized_pnl = realized;
        market.unrealized_pnl = unrealized;

        let total = market.total_pnl();
        market.peak_pnl = market.peak_pnl.max(total);
        market.drawdown = market.peak_pnl - total;

        if !market.halted && market.drawdown >= self.config.max_drawdown_per_market_usdc {
            market.halted = true;
            warn!(
                token = %token,
                drawdown = %market.drawdown,
                "Per-market drawdown breached, halting this market"
            );
        }

        let global_pnl: Decimal = self.markets.values().map(|m| m.total_pnl()).sum();
        self.global_peak_pnl = self.global_peak_pnl.max(global_pnl);
        let global_drawdown = self.global_peak_pnl - global_pnl;

        if global_drawdown >= self.config.max_drawdown_global_usdc {
            error!(
                drawdown = %global_drawdown,
                "Global drawdown breached"
            );
            return self.trigger_halt(HaltReason::GlobalDrawdown, now);
        }
        Vec::new()
    }

    /// Record a failed operation (order placement, fetch, cancel).
    pub fn record_error(&mut self, now: DateTime<Utc>) -> Vec<RiskEffect> {
        self.consecutive_errors += 1;
        self.hourly_errors.push_back(now);
        let hour_ago = now - Duration::hours(1);
        while self.hourly_errors.front().is_some_and(|ts| *ts < hour_ago) {
            self.hourly_errors.pop_front();
        }

        if self.consecutive_errors >= self.config.max_consecutive_errors {
            warn!(
                count = self.consecutive_errors,
                "Consecutive error limit reached"
            );
            return self.trigger_halt(HaltReason::ConsecutiveErrors, now);
        }
        if self.hourly_errors.len() >= self.config.max_hourly_errors {
            warn!(
                count = self.hourly_errors.len(),
                "Hourly error limit reached"
            );
            return self.trigger_halt(HaltReason::ConsecutiveErrors, now);
        }
        Vec::new()
    }

    /// Record a successful operation, resetting the consecutive count.
    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
    }

    /// React to a feed disconnect.
    ///
    /// The public market feed degrades to Warning; losing the user feed
    /// means fills may be silently missed, so it halts.
    pub fn on_disconnect(&mut self, signal: &DisconnectSignal, now: DateTime<Utc>) -> Vec<RiskEffect> {
        match signal.channel {
            DisconnectChannel::Market => self.set_warning(),
            DisconnectChannel::User => self.trigger_halt(HaltReason::UserWsDisconnect, now),
        }
    }

    /// Note a fresh book/trade update for a market.
    pub fn update_feed_time(&mut self, token: &TokenId, now: DateTime<Utc>) {
        let market = self.markets.entry(token.clone()).or_default();
        market.last_feed_update = Some(now);
        market.stale = false;
    }

    /// Re-evaluate feed staleness across markets.
    ///
    /// Any stale market flips the breaker to Warning; when every feed
    /// is fresh again a staleness Warning clears back to Normal.
    pub fn check_staleness(&mut self, now: DateTime<Utc>) -> Vec<RiskEffect> {
        let timeout = Duration::seconds(self.config.stale_feed_timeout_secs);
        let mut any_stale = false;
        for (token, market) in self.markets.iter_mut() {
            let stale = market
                .last_feed_update
                .is_some_and(|ts| now - ts >= timeout);
            if stale && !market.stale {
                warn!(token = %token, "Market feed stale");
            }
            market.stale = stale;
            any_stale |= stale;
        }

        if any_stale {
            self.set_warning()
        } else if self.state == CircuitState::Warning {
            let old = self.state;
            self.state = CircuitState::Normal;
            info!("All feeds fresh, warning cleared");
            vec![RiskEffect::StateChanged {
                old,
                new: CircuitState::Normal,
                reason: None,
            }]
        } else {
            Vec::new()
        }
    }

    /// An unrecoverable feed gap: halt until explicitly resolved.
    pub fn record_data_gap(&mut self, now: DateTime<Utc>) -> Vec<RiskEffect> {
        self.data_gap_open = true;
        self.trigger_halt(HaltReason::WsGapUnresolved, now)
    }

    /// Operator/feed confirmation that the gap has been reconciled.
    /// The only way a `WsGapUnresolved` halt becomes recoverable.
    pub fn resolve_data_gap(&mut self) {
        if self.data_gap_open {
            self.data_gap_open = false;
            info!("Data gap resolved, recovery unblocked");
        }
    }

    /// Halt trading.
    ///
    /// Calling this while already halted is a no-op that preserves the
    /// original reason; the kill switch fires exactly once per
    /// transition into Halted.
    pub fn trigger_halt(&mut self, reason: HaltReason, now: DateTime<Utc>) -> Vec<RiskEffect> {
        if self.state == CircuitState::Halted {
            warn!(new_reason = %reason, "Already halted, keeping original reason");
            return Vec::new();
        }

        let old = self.state;
        self.state = CircuitState::Halted;
        self.halt_reason = Some(reason);
        self.halted_at = Some(now);
        self.recovering_since = None;
        error!(%reason, "CIRCUIT BREAKER HALTED");

        let mut effects = vec![RiskEffect::StateChanged {
            old,
            new: CircuitState::Halted,
            reason: Some(reason),
        }];
        if self.kill_switch.fire() {
            effects.push(RiskEffect::KillSwitch);
        }
        effects
    }

    /// Begin timed recovery. Only valid from Halted, and refused while
    /// a data gap is still open.
    pub fn start_recovery(&mut self, now: DateTime<Utc>) -> Vec<RiskEffect> {
        if self.state != CircuitState::Halted {
            return Vec::new();
        }
        if self.data_gap_open {
            warn!("Recovery refused: data gap unresolved");
            return Vec::new();
        }

        self.state = CircuitState::Recovering;
        self.recovering_since = Some(now);
        self.kill_switch.arm();
        info!("Circuit breaker recovering");
        vec![RiskEffect::StateChanged {
            old: CircuitState::Halted,
            new: CircuitState::Recovering,
            reason: self.halt_reason,
        }]
    }

    /// Complete recovery after the configured interval.
    pub fn poll_recovery(&mut self, now: DateTime<Utc>) -> Vec<RiskEffect> {
        let Some(since) = self.recovering_since else {
            return Vec::new();
        };
        if self.state != CircuitState::Recovering {
            return Vec::new();
        }
        if now - since < Duration::seconds(self.config.circuit_breaker_recovery_secs) {
            return Vec::new();
        }

        self.state = CircuitState::Normal;
        self.halt_reason = None;
        self.halted_at = None;
        self.recovering_since = None;
        self.consecutive_errors = 0;
        info!("Circuit breaker recovered");
        vec![RiskEffect::StateChanged {
            old: CircuitState::Recovering,
            new: CircuitState::Normal,
            reason: None,
        }]
    }

    /// Operator override: clear a per-market drawdown halt.
    pub fn clear_market_halt(&mut self, token: &TokenId) {
        if let Some(market) = self.markets.get_mut(token) {
            if market.halted {
                market.halted = false;
                market.peak_pnl = market.total_pnl();
                market.drawdown = Decimal::ZERO;
                info!(token = %token, "Per-market halt cleared");
            }
        }
    }

    /// Inspectable status: state, reason, per-market detail.
    pub fn status(&self) -> RiskStatus {
        let global_pnl: Decimal = self.markets.values().map(|m| m.total_pnl()).sum();
        let mut markets: Vec<MarketRiskDetail> = self
            .markets
            .iter()
            .map(|(token, m)| MarketRiskDetail {
                token: token.clone(),
                total_pnl: m.total_pnl(),
                peak_pnl: m.peak_pnl,
                drawdown: m.drawdown,
                stale: m.stale,
                halted: m.halted,
            })
            .collect();
        markets.sort_by(|a, b| a.token.as_str().cmp(b.token.as_str()));

        RiskStatus {
            state: self.state,
            halt_reason: self.halt_reason,
            halted_at: self.halted_at,
            recovering_since: self.recovering_since,
            global_pnl,
            global_peak_pnl: self.global_peak_pnl,
            global_drawdown: self.global_peak_pnl - global_pnl,
            consecutive_errors: self.consecutive_errors,
            hourly_errors: self.hourly_errors.len(),
            markets,
        }
    }

    fn set_warning(&mut self) -> Vec<RiskEffect> {
        // Warning only upgrades Normal; it never downgrades Halted or
        // interrupts Recovering.
        if self.state != CircuitState::Normal {
            return Vec::new();
        }
        self.state = CircuitState::Warning;
        warn!("Circuit breaker warning");
        vec![RiskEffect::StateChanged {
            old: CircuitState::Normal,
            new: CircuitState::Warning,
            reason: None,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tok() -> TokenId {
        TokenId::from("tok-a")
    }

    fn tok_b() -> TokenId {
        TokenId::from("tok-b")
    }

    fn manager() -> RiskManager {
        RiskManager::new(RiskConfig::default()).unwrap()
    }

    fn has_kill_switch(effects: &[RiskEffect]) -> bool {
        effects.iter().any(|e| *e == RiskEffect::KillSwitch)
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = RiskConfig {
            max_consecutive_errors: 0,
            ..Default::default()
        };
        assert!(matches!(
            RiskManager::new(config),
            Err(crate::error::RiskError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_initial_state() {
        let mgr = manager();
        assert_eq!(mgr.state(), CircuitState::Normal);
        assert_eq!(mgr.position_limit_multiplier(), dec!(1));
        assert!(mgr.can_place(&tok()));
    }

    #[test]
    fn test_per_market_drawdown_halts_only_that_market() {
        let mut mgr = manager();
        let now = Utc::now();

        // Earn 30, then drop to 5: drawdown 25 >= 20.
        mgr.update_market_pnl(&tok(), dec!(30), dec!(0), now);
        let effects = mgr.update_market_pnl(&tok(), dec!(5), dec!(0), now);

        assert!(effects.is_empty(), "per-market halt is not a breaker event");
        assert!(mgr.market_halted(&tok()));
        assert!(!mgr.can_place(&tok()));

        // Unrelated market still tradeable, global breaker untouched.
        assert!(mgr.can_place(&tok_b()));
        assert_eq!(mgr.state(), CircuitState::Normal);
    }

    #[test]
    fn test_global_drawdown_halts_everything() {
        let mut mgr = manager();
        let now = Utc::now();

        mgr.update_market_pnl(&tok(), dec!(80), dec!(0), now);
        mgr.update_market_pnl(&tok_b(), dec!(40), dec!(0), now);
        // Global peak 120; drop to 15: drawdown 105 >= 100.
        let effects = mgr.update_market_pnl(&tok(), dec!(-25), dec!(0), now);

        assert_eq!(mgr.state(), CircuitState::Halted);
        assert_eq!(mgr.halt_reason(), Some(HaltReason::GlobalDrawdown));
        assert!(has_kill_switch(&effects));
        assert!(!mgr.can_place(&tok_b()));
        assert_eq!(mgr.position_limit_multiplier(), dec!(0));
    }

    #[test]
    fn test_consecutive_errors_halt() {
        let mut mgr = manager();
        let now = Utc::now();

        for _ in 0..4 {
            assert!(mgr.record_error(now).is_empty());
        }
        let effects = mgr.record_error(now);

        assert_eq!(mgr.state(), CircuitState::Halted);
        assert_eq!(mgr.halt_reason(), Some(HaltReason::ConsecutiveErrors));
        assert!(has_kill_switch(&effects));
    }

    #[test]
    fn test_success_resets_consecutive_errors() {
        let mut mgr = manager();
        let now = Utc::now();

        for _ in 0..4 {
            mgr.record_error(now);
        }
        mgr.record_success();
        assert!(mgr.record_error(now).is_empty());
        assert_eq!(mgr.state(), CircuitState::Normal);
    }

    #[test]
    fn test_hourly_error_window() {
        let config = RiskConfig {
            max_consecutive_errors: 100, // out of the way
            max_hourly_errors: 3,
            ..Default::default()
        };
        let mut mgr = RiskManager::new(config).unwrap();
        let t0 = Utc::now();

        // Two old errors slide out of the window before the burst.
        mgr.record_error(t0);
        mgr.record_error(t0 + Duration::minutes(1));
        assert!(mgr
            .record_error(t0 + Duration::minutes(90))
            .is_empty());
        assert_eq!(mgr.status().hourly_errors, 1);

        mgr.record_error(t0 + Duration::minutes(91));
        let effects = mgr.record_error(t0 + Duration::minutes(92));
        assert_eq!(mgr.state(), CircuitState::Halted);
        assert!(has_kill_switch(&effects));
    }

    #[test]
    fn test_user_disconnect_halts_market_disconnect_warns() {
        let mut mgr = manager();
        let now = Utc::now();

        let effects = mgr.on_disconnect(
            &DisconnectSignal {
                channel: DisconnectChannel::Market,
            },
            now,
        );
        assert_eq!(mgr.state(), CircuitState::Warning);
        assert!(!has_kill_switch(&effects));
        assert_eq!(mgr.position_limit_multiplier(), dec!(0.5));

        let effects = mgr.on_disconnect(
            &DisconnectSignal {
                channel: DisconnectChannel::User,
            },
            now,
        );
        assert_eq!(mgr.state(), CircuitState::Halted);
        assert_eq!(mgr.halt_reason(), Some(HaltReason::UserWsDisconnect));
        assert!(has_kill_switch(&effects));
    }

    #[test]
    fn test_warning_never_downgrades_halted() {
        let mut mgr = manager();
        let now = Utc::now();

        mgr.trigger_halt(HaltReason::Manual, now);
        let effects = mgr.on_disconnect(
            &DisconnectSignal {
                channel: DisconnectChannel::Market,
            },
            now,
        );

        assert!(effects.is_empty());
        assert_eq!(mgr.state(), CircuitState::Halted);
        assert_eq!(mgr.halt_reason(), Some(HaltReason::Manual));
    }

    #[test]
    fn test_kill_switch_fires_exactly_once() {
        let mut mgr = manager();
        let now = Utc::now();

        let first = mgr.trigger_halt(HaltReason::Manual, now);
        assert!(has_kill_switch(&first));

        // Re-halting while halted: no-op, no second kill switch,
        // original reason kept.
        let second = mgr.trigger_halt(HaltReason::GlobalDrawdown, now);
        assert!(second.is_empty());
        assert_eq!(mgr.halt_reason(), Some(HaltReason::Manual));
    }

    #[test]
    fn test_kill_switch_rearms_after_recovery() {
        let mut mgr = manager();
        let t0 = Utc::now();

        assert!(has_kill_switch(&mgr.trigger_halt(HaltReason::Manual, t0)));
        mgr.start_recovery(t0);
        mgr.poll_recovery(t0 + Duration::seconds(61));
        assert_eq!(mgr.state(), CircuitState::Normal);

        // A fresh halt gets a fresh kill switch.
        assert!(has_kill_switch(
            &mgr.trigger_halt(HaltReason::Manual, t0 + Duration::seconds(62))
        ));
    }

    #[test]
    fn test_recovery_path() {
        let mut mgr = manager();
        let t0 = Utc::now();

        mgr.trigger_halt(HaltReason::ConsecutiveErrors, t0);

        // Recovery only starts explicitly.
        assert!(mgr.poll_recovery(t0 + Duration::hours(1)).is_empty());
        assert_eq!(mgr.state(), CircuitState::Halted);

        let effects = mgr.start_recovery(t0);
        assert_eq!(mgr.state(), CircuitState::Recovering);
        assert_eq!(mgr.position_limit_multiplier(), dec!(0.25));
        assert_eq!(
            effects,
            vec![RiskEffect::StateChanged {
                old: CircuitState::Halted,
                new: CircuitState::Recovering,
                reason: Some(HaltReason::ConsecutiveErrors),
            }]
        );

        // Interval not yet elapsed.
        assert!(mgr.poll_recovery(t0 + Duration::seconds(30)).is_empty());
        assert_eq!(mgr.state(), CircuitState::Recovering);

        // Elapsed: back to normal, reason cleared.
        let effects = mgr.poll_recovery(t0 + Duration::seconds(60));
        assert_eq!(mgr.state(), CircuitState::Normal);
        assert!(mgr.halt_reason().is_none());
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_data_gap_blocks_recovery_until_resolved() {
        let mut mgr = manager();
        let t0 = Utc::now();

        mgr.record_data_gap(t0);
        assert_eq!(mgr.halt_reason(), Some(HaltReason::WsGapUnresolved));

        // Timed recovery alone never clears a data-integrity halt.
        assert!(mgr.start_recovery(t0 + Duration::hours(1)).is_empty());
        assert_eq!(mgr.state(), CircuitState::Halted);

        mgr.resolve_data_gap();
        assert!(!mgr.start_recovery(t0 + Duration::hours(1)).is_empty());
        assert_eq!(mgr.state(), CircuitState::Recovering);
    }

    #[test]
    fn test_staleness_warns_and_clears() {
        let mut mgr = manager();
        let t0 = Utc::now();

        mgr.update_feed_time(&tok(), t0);
        assert!(mgr.check_staleness(t0 + Duration::seconds(10)).is_empty());
        assert_eq!(mgr.state(), CircuitState::Normal);

        // 31s of silence: stale, warn.
        let effects = mgr.check_staleness(t0 + Duration::seconds(31));
        assert_eq!(mgr.state(), CircuitState::Warning);
        assert_eq!(effects.len(), 1);
        assert!(mgr.status().markets[0].stale);

        // Feed returns: warning clears.
        mgr.update_feed_time(&tok(), t0 + Duration::seconds(35));
        let effects = mgr.check_staleness(t0 + Duration::seconds(36));
        assert_eq!(mgr.state(), CircuitState::Normal);
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_clear_market_halt() {
        let mut mgr = manager();
        let now = Utc::now();

        mgr.update_market_pnl(&tok(), dec!(30), dec!(0), now);
        mgr.update_market_pnl(&tok(), dec!(5), dec!(0), now);
        assert!(mgr.market_halted(&tok()));

        mgr.clear_market_halt(&tok());
        assert!(!mgr.market_halted(&tok()));
        // High-water mark rebased so the same PnL does not re-halt.
        let effects = mgr.update_market_pnl(&tok(), dec!(5), dec!(0), now);
        assert!(effects.is_empty());
        assert!(!mgr.market_halted(&tok()));
    }

    #[test]
    fn test_status_reports_detail() {
        let mut mgr = manager();
        let now = Utc::now();

        mgr.update_market_pnl(&tok(), dec!(10), dec!(2), now);
        mgr.record_error(now);

        let status = mgr.status();
        assert_eq!(status.state, CircuitState::Normal);
        assert!(status.halt_reason.is_none());
        assert_eq!(status.global_pnl, dec!(12));
        assert_eq!(status.global_peak_pnl, dec!(12));
        assert_eq!(status.consecutive_errors, 1);
        assert_eq!(status.hourly_errors, 1);
        assert_eq!(status.markets.len(), 1);
        assert_eq!(status.markets[0].total_pnl, dec!(12));
    }
}
