//! Trade lifecycle controller
//!
//! Drives one trade at a time through
//! `Idle → ProposalRequested → BuyPending → Open → Idle` and performs the
//! settlement bookkeeping (stats, trade log, strategy feedback, staking and
//! risk checks).

use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::common::errors::{EngineError, Result};
use crate::common::traits::Transport;
use crate::common::types::{
    AuthorizeInfo, ConnectionStatus, Contract, ContractType, EngineEvent, Proposal,
    StatsSnapshot, Tick, TradeConfig, TradeRecord, TransportEvent, VenueError,
};
use crate::config::types::AppConfig;
use crate::engine::risk::RiskGuard;
use crate::engine::session::SessionStats;
use crate::engine::staking::{StakeState, StakingPolicy};
use crate::market::TickHistory;
use crate::strategy::{Activation, StrategyContext, StrategyKind, StrategyManager};

/// Where the controller is in the trade lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradePhase {
    Idle,
    /// Proposal sent, waiting for the quote
    ProposalRequested,
    /// Buy sent, waiting for the confirmation
    BuyPending,
    /// Contract bought, waiting for settlement
    Open,
}

/// The single trade in flight
#[derive(Debug, Clone)]
pub struct PendingTrade {
    pub config: TradeConfig,
    pub phase: TradePhase,
    /// Strategy active when the trade was shaped
    pub strategy: StrategyKind,
    /// Martingale step the stake was taken from
    pub martingale_step: u32,
    pub proposal: Option<Proposal>,
    pub contract_id: Option<String>,
    pub submitted_at: Instant,
}

impl PendingTrade {
    fn new(config: TradeConfig, strategy: StrategyKind, martingale_step: u32) -> Self {
        Self {
            config,
            phase: TradePhase::ProposalRequested,
            strategy,
            martingale_step,
            proposal: None,
            contract_id: None,
            submitted_at: Instant::now(),
        }
    }

    /// Still waiting on the venue to accept the order
    fn is_unconfirmed(&self) -> bool {
        matches!(
            self.phase,
            TradePhase::ProposalRequested | TradePhase::BuyPending
        )
    }
}

/// What a produce-and-submit cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A proposal was requested for this trade
    Submitted(TradeConfig),
    /// The active strategy skipped the cycle
    Vetoed { strategy: StrategyKind },
    /// Scheduler disabled
    NotTrading,
    /// A trade is already in flight
    Busy,
    /// The cycle failed before a proposal was requested
    Skipped { reason: String },
}

/// Owns every piece of mutable engine state and the transport
pub struct TradeController<T: Transport> {
    transport: T,
    config: AppConfig,
    market: String,
    /// Base contract type chosen by the last strategy activation
    preferred_contract_type: Option<ContractType>,
    ticks: TickHistory,
    strategies: StrategyManager,
    stats: SessionStats,
    stake: StakeState,
    trading: bool,
    pending: Option<PendingTrade>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl<T: Transport> TradeController<T> {
    /// Create a controller with the configured strategy already activated
    pub fn new(transport: T, config: AppConfig, events: mpsc::UnboundedSender<EngineEvent>) -> Self {
        let mut strategies = StrategyManager::new(config.strategy.active);
        let activation = {
            let ctx = StrategyContext::from_config(&config);
            strategies.activate(config.strategy.active, &ctx)
        };

        Self {
            market: config.trade.market.clone(),
            stake: StakeState::initial(&config.martingale),
            preferred_contract_type: activation.preferred_contract_type,
            transport,
            config,
            ticks: TickHistory::new(),
            strategies,
            stats: SessionStats::new(),
            trading: false,
            pending: None,
            events,
        }
    }

    /// Connect the transport, start its event feed and subscribe to ticks
    #[instrument(skip(self, sender), fields(venue = self.transport.venue_name()))]
    pub async fn connect(
        &mut self,
        sender: mpsc::Sender<TransportEvent>,
    ) -> Result<AuthorizeInfo> {
        let account = self.transport.connect().await?;
        info!(
            login_id = %account.login_id,
            balance = %account.balance,
            currency = %account.currency,
            "authorized"
        );
        self.emit(EngineEvent::Balance {
            amount: account.balance,
            currency: account.currency.clone(),
        });

        self.transport.start(sender).await?;
        self.transport.subscribe_ticks(&self.market).await?;
        info!(market = %self.market, "subscribed to ticks");
        Ok(account)
    }

    pub async fn disconnect(&mut self) -> Result<()> {
        self.trading = false;
        self.transport.disconnect().await
    }

    // ========================================================================
    // Operator actions
    // ========================================================================

    /// Enable the cycle scheduler
    ///
    /// Requires enough buffered ticks for the strategies to work with. The
    /// martingale progression and the loss streak start over.
    pub fn start_trading(&mut self) -> Result<()> {
        let need = self.config.engine.min_ticks;
        if self.ticks.len() < need {
            return Err(EngineError::InsufficientTicks {
                have: self.ticks.len(),
                need,
            });
        }

        self.stake = StakeState::initial(&self.config.martingale);
        self.stats.clear_streak();
        self.trading = true;
        info!(
            strategy = %self.strategies.active(),
            stake = %self.stake.stake,
            market = %self.market,
            "trading started"
        );
        self.emit(EngineEvent::TradingStarted);
        self.emit_stats();
        Ok(())
    }

    /// Disable the cycle scheduler; a trade in flight still runs to settlement
    pub fn stop_trading(&mut self, reason: &str) {
        if !self.trading {
            return;
        }
        self.trading = false;
        info!(reason, pending = self.pending.is_some(), "trading stopped");
        self.emit(EngineEvent::TradingStop {
            reason: reason.to_string(),
        });
    }

    /// Run one produce-and-submit cycle on demand
    pub async fn execute_single_trade(&mut self) -> Result<CycleOutcome> {
        if self.pending.is_some() {
            return Err(EngineError::TradeInFlight);
        }
        if !self.transport.is_connected() {
            return Err(EngineError::NotConnected);
        }
        self.produce_and_submit().await
    }

    /// Switch the active strategy by name; unknown names are ignored
    pub fn set_active_strategy(&mut self, name: &str) -> Option<Activation> {
        let ctx = StrategyContext::from_config(&self.config);
        let activation = self.strategies.set_active(name, &ctx)?;
        self.preferred_contract_type = activation.preferred_contract_type;
        self.emit(EngineEvent::StrategyChanged {
            strategy: activation.kind,
        });
        Some(activation)
    }

    /// Subscribe to a different market, discarding the buffered ticks
    #[instrument(skip(self))]
    pub async fn change_market(&mut self, market: &str) -> Result<()> {
        let market = market.trim();
        if market.is_empty() {
            return Err(EngineError::Configuration("market is empty".to_string()));
        }
        self.ticks.clear();
        self.market = market.to_string();
        self.transport.subscribe_ticks(market).await?;
        info!(market, "market changed, tick history cleared");
        Ok(())
    }

    /// Zero the statistics and trade log and reset every strategy
    ///
    /// The tick history is kept.
    pub fn reset_session(&mut self) {
        self.stats.reset();
        self.strategies.reset();
        self.stake = StakeState::initial(&self.config.martingale);
        info!("session reset");
        self.emit(EngineEvent::SessionReset);
        self.emit_stats();
    }

    /// Swap in a new configuration, effective from the next cycle
    pub fn update_config(&mut self, config: AppConfig) -> Result<()> {
        config.validate()?;
        let activate = config.strategy.active != self.strategies.active();
        let initial_changed = config.martingale != self.config.martingale;
        self.config = config;

        if initial_changed && self.stake.step == 0 {
            self.stake = StakeState::initial(&self.config.martingale);
        }
        if activate {
            let kind = self.config.strategy.active;
            self.set_active_strategy(kind.as_str());
        }
        info!("configuration updated");
        Ok(())
    }

    // ========================================================================
    // Scheduler
    // ========================================================================

    /// Handle one scheduler trigger
    pub async fn on_cycle(&mut self) -> CycleOutcome {
        self.check_pending_timeout(Instant::now());

        if !self.trading {
            return CycleOutcome::NotTrading;
        }
        if self.pending.is_some() {
            debug!("trade in flight, cycle skipped");
            return CycleOutcome::Busy;
        }

        match self.produce_and_submit().await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_trade_scoped() {
                    warn!(error = %e, "trade cycle failed");
                } else {
                    error!(error = %e, "trade cycle failed");
                }
                self.report_failure("trade cycle", &e);
                CycleOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Abort a trade the venue never answered
    ///
    /// Returns true when a trade was aborted. Open contracts never time out.
    pub fn check_pending_timeout(&mut self, now: Instant) -> bool {
        let timeout = Duration::from_secs(self.config.engine.pending_timeout_secs);
        let expired = self.pending.as_ref().is_some_and(|pending| {
            pending.is_unconfirmed() && now.duration_since(pending.submitted_at) >= timeout
        });
        if expired {
            self.abort_pending(&EngineError::Timeout(format!(
                "no venue answer within {}s",
                timeout.as_secs()
            )));
        }
        expired
    }

    async fn produce_and_submit(&mut self) -> Result<CycleOutcome> {
        let base = self.base_trade_config();
        let active = self.strategies.active();

        let shaped = {
            let ctx = StrategyContext::from_config(&self.config);
            self.strategies.modify_trade_config(base, &self.ticks, &ctx)
        };
        let Some(config) = shaped else {
            debug!(strategy = %active, "strategy vetoed the cycle");
            return Ok(CycleOutcome::Vetoed { strategy: active });
        };

        config.validate()?;
        if !self.transport.is_connected() {
            return Err(EngineError::NotConnected);
        }

        self.pending = Some(PendingTrade::new(config.clone(), active, self.stake.step));
        info!(
            strategy = %active,
            contract_type = %config.contract_type,
            target = ?config.target_digit.map(|d| d.value()),
            stake = %config.stake,
            market = %config.market,
            step = self.stake.step,
            "proposal requested"
        );

        if let Err(e) = self.transport.submit_proposal(&config).await {
            self.abort_pending(&e);
            return Err(e);
        }
        self.emit(EngineEvent::TradeSubmitted(config.clone()));
        Ok(CycleOutcome::Submitted(config))
    }

    fn base_trade_config(&self) -> TradeConfig {
        let defaults = &self.config.trade;
        TradeConfig {
            contract_type: self
                .preferred_contract_type
                .unwrap_or(defaults.contract_type),
            target_digit: Some(defaults.target_digit),
            stake: self.stake.stake,
            market: self.market.clone(),
            duration_ticks: defaults.duration_ticks,
        }
    }

    // ========================================================================
    // Transport events
    // ========================================================================

    /// Apply one inbound transport event
    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Tick(tick) => self.on_tick(tick),
            TransportEvent::Balance { amount, currency } => {
                debug!(balance = %amount, currency = %currency, "balance update");
                self.emit(EngineEvent::Balance { amount, currency });
            }
            TransportEvent::Proposal(proposal) => self.on_proposal(proposal).await,
            TransportEvent::ProposalError(err) => self.on_proposal_error(err),
            TransportEvent::Bought {
                contract_id,
                buy_price,
            } => self.on_bought(contract_id, buy_price).await,
            TransportEvent::BuyError(err) => self.on_buy_error(err),
            TransportEvent::ContractUpdate(contract) => self.on_contract_update(contract),
            TransportEvent::Error(err) => {
                error!(code = %err.code, message = %err.message, "venue error");
                self.report_failure("venue", &err);
            }
            TransportEvent::ConnectionStatus(status) => self.on_connection_status(status),
        }
    }

    /// Buffer a tick of the subscribed market, dropping any other
    fn on_tick(&mut self, tick: Tick) {
        if tick.market != self.market {
            debug!(market = %tick.market, "ignoring tick for unsubscribed market");
            return;
        }
        let digit = self.ticks.push(tick);
        debug!(digit = digit.value(), buffered = self.ticks.len(), "tick");
    }

    async fn on_proposal(&mut self, proposal: Proposal) {
        let Some(pending) = self
            .pending
            .as_mut()
            .filter(|p| p.phase == TradePhase::ProposalRequested)
        else {
            warn!(proposal_id = %proposal.id, "ignoring unexpected proposal");
            return;
        };

        pending.phase = TradePhase::BuyPending;
        pending.proposal = Some(proposal.clone());
        info!(
            proposal_id = %proposal.id,
            price = %proposal.price,
            payout = %proposal.payout,
            "proposal received, buying"
        );

        if let Err(e) = self.transport.submit_buy(&proposal.id, proposal.price).await {
            self.abort_pending(&e);
        }
    }

    fn on_proposal_error(&mut self, err: VenueError) {
        if self.phase() != TradePhase::ProposalRequested {
            warn!(code = %err.code, "ignoring proposal error with no proposal outstanding");
            return;
        }
        self.abort_pending(&EngineError::ProposalRejected {
            code: err.code,
            message: err.message,
        });
    }

    async fn on_bought(&mut self, contract_id: String, buy_price: Decimal) {
        let Some(pending) = self
            .pending
            .as_mut()
            .filter(|p| p.phase == TradePhase::BuyPending)
        else {
            warn!(contract_id = %contract_id, "ignoring buy confirmation for no pending buy");
            return;
        };

        pending.phase = TradePhase::Open;
        pending.contract_id = Some(contract_id.clone());
        info!(contract_id = %contract_id, buy_price = %buy_price, "contract opened");

        if let Err(e) = self.transport.subscribe_contract(&contract_id).await {
            self.abort_pending(&e);
        }
    }

    fn on_buy_error(&mut self, err: VenueError) {
        if self.phase() != TradePhase::BuyPending {
            warn!(code = %err.code, "ignoring buy error with no buy outstanding");
            return;
        }
        self.abort_pending(&EngineError::BuyRejected {
            code: err.code,
            message: err.message,
        });
    }

    fn on_contract_update(&mut self, contract: Contract) {
        let tracked = self.pending.as_ref().is_some_and(|p| {
            p.phase == TradePhase::Open && p.contract_id.as_deref() == Some(contract.id.as_str())
        });
        if !tracked {
            warn!(contract_id = %contract.id, "ignoring update for untracked contract");
            return;
        }
        if !contract.is_settled() {
            debug!(contract_id = %contract.id, "contract still open");
            return;
        }
        if let Some(pending) = self.pending.take() {
            self.settle(pending, contract);
        }
    }

    fn on_connection_status(&mut self, status: ConnectionStatus) {
        match status {
            ConnectionStatus::Connected => info!("transport connected"),
            ConnectionStatus::Disconnected(reason) => {
                let reason = reason.unwrap_or_else(|| "connection closed".to_string());
                warn!(reason = %reason, "transport disconnected");
                self.on_connection_lost(reason);
            }
            ConnectionStatus::Error(reason) => {
                error!(reason = %reason, "transport error");
                self.on_connection_lost(reason);
            }
        }
    }

    fn on_connection_lost(&mut self, reason: String) {
        if self.pending.as_ref().is_some_and(PendingTrade::is_unconfirmed) {
            self.abort_pending(&EngineError::Transport(reason.clone()));
        }
        self.report_failure("connection", &reason);
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    fn settle(&mut self, pending: PendingTrade, contract: Contract) {
        // 1-2. outcome and stats
        let won = self.stats.record_result(contract.profit);

        // 3. trade log
        let record = TradeRecord {
            time: Utc::now(),
            contract_id: contract.id,
            contract_type: contract.contract_type,
            market: contract.market,
            target_digit: contract.target_digit,
            stake: contract.buy_price,
            payout: contract.payout,
            won,
            profit: contract.profit,
            martingale_step: pending.martingale_step,
            strategy: pending.strategy,
        };
        self.stats.log_trade(record.clone());

        // 4. strategy feedback, only to the strategy that placed the trade
        if pending.strategy == self.strategies.active() {
            let ctx = StrategyContext::from_config(&self.config);
            self.strategies.on_trade_result(won, &ctx);
        } else {
            debug!(
                placed_by = %pending.strategy,
                active = %self.strategies.active(),
                "strategy changed since placement, outcome not forwarded"
            );
        }

        // 5. staking
        self.stake = StakingPolicy::new(&self.config.martingale).next(self.stake, won);

        info!(
            contract_id = %record.contract_id,
            won,
            profit = %record.profit,
            total_pnl = %self.stats.total_pnl(),
            next_stake = %self.stake.stake,
            step = self.stake.step,
            "contract settled"
        );

        // 6. risk
        let stop = RiskGuard::new(&self.config.risk).evaluate(&self.stats);

        self.emit_stats();
        self.emit(EngineEvent::TradeComplete(record));

        if let Some(reason) = stop {
            self.trading = false;
            warn!(reason = %reason, "risk limit hit, trading stopped");
            self.emit(EngineEvent::TradingStop {
                reason: reason.to_string(),
            });
        }
    }

    fn abort_pending(&mut self, err: &EngineError) {
        if let Some(pending) = self.pending.take() {
            warn!(
                phase = ?pending.phase,
                contract_type = %pending.config.contract_type,
                error = %err,
                "trade aborted"
            );
            self.emit(EngineEvent::TradeAborted {
                reason: err.to_string(),
            });
        }
    }

    // ========================================================================
    // Events and accessors
    // ========================================================================

    fn emit(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            debug!("no engine event subscriber");
        }
    }

    /// Surface a failed action to the presentation layer
    pub fn report_failure(&self, action: &str, reason: &dyn std::fmt::Display) {
        self.emit(EngineEvent::Failure {
            action: action.to_string(),
            reason: reason.to_string(),
        });
    }

    fn emit_stats(&self) {
        self.emit(EngineEvent::StatsUpdate(self.stats_snapshot()));
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot(self.stake)
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn stake(&self) -> StakeState {
        self.stake
    }

    pub fn is_trading(&self) -> bool {
        self.trading
    }

    pub fn phase(&self) -> TradePhase {
        self.pending
            .as_ref()
            .map_or(TradePhase::Idle, |pending| pending.phase)
    }

    pub fn pending(&self) -> Option<&PendingTrade> {
        self.pending.as_ref()
    }

    pub fn tick_history(&self) -> &TickHistory {
        &self.ticks
    }

    pub fn strategies(&self) -> &StrategyManager {
        &self.strategies
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
