//! Simulated venue for paper trading
//!
//! Generates a random-walk quote stream per market, prices proposals from
//! the contract's win probability and settles bought contracts on the
//! market's own ticks. Nothing leaves the process.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::pricing;
use crate::common::errors::{EngineError, Result};
use crate::common::traits::Transport;
use crate::common::types::{
    AuthorizeInfo, ConnectionStatus, Contract, ContractStatus, Proposal, Tick, TradeConfig,
    TransportEvent, VenueError,
};
use crate::config::types::PaperConfig;

/// Largest quote move per tick, in cents
const MAX_STEP_CENTS: i64 = 50;

/// Quote waiting to be bought
#[derive(Debug, Clone)]
struct Quote {
    config: TradeConfig,
    payout: Decimal,
}

/// Bought contract waiting for its exit tick
#[derive(Debug, Clone)]
struct Position {
    contract: Contract,
    entry_quote: Decimal,
    ticks_left: u32,
}

#[derive(Debug)]
struct VenueState {
    rng: StdRng,
    balance: Decimal,
    currency: String,
    house_margin: Decimal,
    start_quote: Decimal,
    /// Last quote of every market seen so far
    quotes: HashMap<String, Decimal>,
    /// Market whose ticks are forwarded
    tick_market: Option<String>,
    /// Unbought quotes, replaced whenever a new proposal is issued
    proposals: HashMap<String, Quote>,
    positions: Vec<Position>,
    /// Open contracts whose updates are forwarded
    watched: HashSet<String>,
    next_id: u64,
}

impl VenueState {
    fn new(config: &PaperConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            balance: config.start_balance,
            currency: config.currency.clone(),
            house_margin: config.house_margin,
            start_quote: config.start_quote,
            quotes: HashMap::new(),
            tick_market: None,
            proposals: HashMap::new(),
            positions: Vec::new(),
            watched: HashSet::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn quote(&mut self, market: &str) -> Decimal {
        let start = self.start_quote;
        *self.quotes.entry(market.to_string()).or_insert(start)
    }

    /// Move every known market one step and collect the resulting events
    fn advance(&mut self) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        let markets: Vec<String> = self.quotes.keys().cloned().collect();

        for market in markets {
            let last = self.quotes.get(&market).copied().unwrap_or(self.start_quote);
            let step = Decimal::new(self.rng.gen_range(-MAX_STEP_CENTS..=MAX_STEP_CENTS), 2);
            let mut next = (last + step).round_dp(2);
            if next <= Decimal::ZERO {
                next = last - step;
            }
            self.quotes.insert(market.clone(), next);

            if self.tick_market.as_deref() == Some(market.as_str()) {
                events.push(TransportEvent::Tick(Tick::new(market.clone(), next)));
            }
            self.settle_positions(&market, next, &mut events);
        }
        events
    }

    fn settle_positions(&mut self, market: &str, quote: Decimal, events: &mut Vec<TransportEvent>) {
        let mut still_open = Vec::with_capacity(self.positions.len());

        for mut position in std::mem::take(&mut self.positions) {
            if position.contract.market != market {
                still_open.push(position);
                continue;
            }

            position.ticks_left = position.ticks_left.saturating_sub(1);
            if position.ticks_left > 0 {
                if self.watched.contains(&position.contract.id) {
                    events.push(TransportEvent::ContractUpdate(position.contract.clone()));
                }
                still_open.push(position);
                continue;
            }

            let contract = &mut position.contract;
            let won = pricing::is_win(
                contract.contract_type,
                contract.target_digit,
                position.entry_quote,
                quote,
            );
            contract.profit = if won {
                contract.payout - contract.buy_price
            } else {
                -contract.buy_price
            };
            if won {
                self.balance += contract.payout;
            }
            contract.status = ContractStatus::Sold;
            contract.is_sold = true;
            debug!(contract_id = %contract.id, won, exit = %quote, "paper contract settled");

            if self.watched.remove(&contract.id) {
                events.push(TransportEvent::ContractUpdate(contract.clone()));
            }
            events.push(TransportEvent::Balance {
                amount: self.balance,
                currency: self.currency.clone(),
            });
        }
        self.positions = still_open;
    }
}

/// In-process [`Transport`] backed by a random-walk market
pub struct PaperVenue {
    config: PaperConfig,
    state: Arc<Mutex<VenueState>>,
    sender: Option<mpsc::Sender<TransportEvent>>,
    feed: Option<JoinHandle<()>>,
    connected: bool,
}

impl PaperVenue {
    pub fn new(config: PaperConfig) -> Self {
        let state = VenueState::new(&config);
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
            sender: None,
            feed: None,
            connected: false,
        }
    }

    pub async fn balance(&self) -> Decimal {
        self.state.lock().await.balance
    }

    /// Advance the market by one tick without waiting for the feed timer
    pub async fn step(&self) -> Result<()> {
        let events = self.state.lock().await.advance();
        self.deliver(events)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(EngineError::NotConnected)
        }
    }

    /// Queue replies once the state lock is released
    ///
    /// Replies are produced on the engine's own task, which is also the
    /// channel's consumer, so they must never wait for capacity.
    fn deliver(&self, events: Vec<TransportEvent>) -> Result<()> {
        let Some(sender) = &self.sender else {
            return Ok(());
        };
        for event in events {
            sender
                .try_send(event)
                .map_err(|e| EngineError::ChannelSend(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for PaperVenue {
    #[instrument(skip(self))]
    async fn connect(&mut self) -> Result<AuthorizeInfo> {
        self.connected = true;
        let balance = self.state.lock().await.balance;
        info!(balance = %balance, "paper venue connected");
        Ok(AuthorizeInfo {
            login_id: "PAPER".to_string(),
            balance,
            currency: self.config.currency.clone(),
        })
    }

    #[instrument(skip(self, sender))]
    async fn start(&mut self, sender: mpsc::Sender<TransportEvent>) -> Result<()> {
        self.ensure_connected()?;
        self.sender = Some(sender.clone());
        sender
            .send(TransportEvent::ConnectionStatus(ConnectionStatus::Connected))
            .await?;

        if let Some(feed) = self.feed.take() {
            feed.abort();
        }

        let state = Arc::clone(&self.state);
        let period = Duration::from_millis(self.config.tick_interval_ms);
        self.feed = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let events = state.lock().await.advance();
                for event in events {
                    if sender.send(event).await.is_err() {
                        debug!("event receiver dropped, paper feed stopping");
                        return;
                    }
                }
            }
        }));
        Ok(())
    }

    async fn subscribe_ticks(&mut self, market: &str) -> Result<()> {
        self.ensure_connected()?;
        let mut state = self.state.lock().await;
        state.quote(market);
        state.tick_market = Some(market.to_string());
        info!(market, "paper tick subscription");
        Ok(())
    }

    async fn submit_proposal(&mut self, config: &TradeConfig) -> Result<()> {
        self.ensure_connected()?;
        let event = {
            let mut state = self.state.lock().await;
            match pricing::win_tenths(config.contract_type, config.target_digit) {
                Ok(tenths) => {
                    let payout = pricing::payout(config.stake, tenths, state.house_margin);
                    let id = state.next_id("P");
                    state.quote(&config.market);
                    let stale = state.proposals.len();
                    if stale > 0 {
                        debug!(stale, "dropping unbought proposals");
                        state.proposals.clear();
                    }
                    state.proposals.insert(
                        id.clone(),
                        Quote {
                            config: config.clone(),
                            payout,
                        },
                    );
                    TransportEvent::Proposal(Proposal {
                        id,
                        price: config.stake,
                        payout,
                    })
                }
                Err(err) => {
                    warn!(code = %err.code, "paper proposal rejected");
                    TransportEvent::ProposalError(err)
                }
            }
        };
        self.deliver(vec![event])
    }

    async fn submit_buy(&mut self, proposal_id: &str, price: Decimal) -> Result<()> {
        self.ensure_connected()?;
        let events = {
            let mut state = self.state.lock().await;
            match state.proposals.remove(proposal_id) {
                None => vec![TransportEvent::BuyError(VenueError::new(
                    "InvalidProposal",
                    format!("unknown proposal {proposal_id}"),
                ))],
                Some(_) if price > state.balance => {
                    vec![TransportEvent::BuyError(VenueError::new(
                        "InsufficientBalance",
                        format!("balance {} below price {price}", state.balance),
                    ))]
                }
                Some(quote) => {
                    state.balance -= price;
                    let id = state.next_id("C");
                    let entry_quote = state.quote(&quote.config.market);
                    let contract = Contract {
                        id: id.clone(),
                        contract_type: quote.config.contract_type,
                        market: quote.config.market.clone(),
                        target_digit: quote.config.target_digit,
                        buy_price: price,
                        payout: quote.payout,
                        status: ContractStatus::Open,
                        is_sold: false,
                        profit: Decimal::ZERO,
                    };
                    state.positions.push(Position {
                        contract,
                        entry_quote,
                        ticks_left: quote.config.duration_ticks.max(1),
                    });
                    vec![
                        TransportEvent::Bought {
                            contract_id: id,
                            buy_price: price,
                        },
                        TransportEvent::Balance {
                            amount: state.balance,
                            currency: state.currency.clone(),
                        },
                    ]
                }
            }
        };
        self.deliver(events)
    }

    async fn subscribe_contract(&mut self, contract_id: &str) -> Result<()> {
        self.ensure_connected()?;
        let mut state = self.state.lock().await;
        if state.positions.iter().any(|p| p.contract.id == contract_id) {
            state.watched.insert(contract_id.to_string());
        } else {
            debug!(contract_id, "no open paper contract to watch");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn disconnect(&mut self) -> Result<()> {
        if let Some(feed) = self.feed.take() {
            feed.abort();
        }
        self.sender = None;
        self.connected = false;
        info!("paper venue disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn venue_name(&self) -> &'static str {
        "paper"
    }
}

impl Drop for PaperVenue {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.abort();
        }
    }
}
