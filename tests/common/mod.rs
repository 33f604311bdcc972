//! Common test utilities and fixtures

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use digit_trader::common::types::{
    AuthorizeInfo, Contract, ContractStatus, Proposal, Tick, TradeConfig, TransportEvent,
};
use digit_trader::common::channels::{create_engine_event_channel, create_transport_channel};
use digit_trader::{
    AppConfig, CycleOutcome, EngineError, EngineEvent, Result, StrategyKind, TradeController,
    Transport,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

pub const MARKET: &str = "R_100";

/// Request seen by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Start,
    SubscribeTicks(String),
    Proposal(TradeConfig),
    Buy { proposal_id: String, price: Decimal },
    SubscribeContract(String),
    Disconnect,
}

/// Scripted venue that records every request
///
/// When answering, each proposal is quoted at the stake with a 9% return,
/// each buy is confirmed and each contract subscription settles the
/// contract immediately with the next scripted profit (a win if the script
/// is exhausted). Clones share the call log and the event channel.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    calls: Arc<Mutex<Vec<Call>>>,
    outcomes: Arc<Mutex<VecDeque<Option<Decimal>>>>,
    answering: bool,
    connected: bool,
    sender: Arc<Mutex<Option<mpsc::Sender<TransportEvent>>>>,
    quotes: HashMap<String, TradeConfig>,
    contracts: HashMap<String, TradeConfig>,
    next_id: u64,
}

impl RecordingTransport {
    /// Records requests and never answers
    pub fn silent() -> Self {
        Self::default()
    }

    /// Answers every request, settling contracts with `profits` in order
    ///
    /// A profit of `None` in the script means "win at the quoted payout".
    pub fn answering(profits: &[Option<Decimal>]) -> Self {
        let transport = Self {
            answering: true,
            ..Self::default()
        };
        transport
            .outcomes
            .lock()
            .unwrap()
            .extend(profits.iter().copied());
        transport
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Trade configs of every proposal request, oldest first
    pub fn proposals(&self) -> Vec<TradeConfig> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Proposal(config) => Some(config),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Push an unsolicited event, as the venue's own feed would
    pub fn inject(&self, event: TransportEvent) -> Result<()> {
        match self.sender.lock().unwrap().as_ref() {
            Some(sender) => sender
                .try_send(event)
                .map_err(|e| EngineError::ChannelSend(e.to_string())),
            None => Err(EngineError::NotConnected),
        }
    }

    fn reply(&self, event: TransportEvent) -> Result<()> {
        if !self.answering {
            return Ok(());
        }
        self.inject(event)
    }

    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn connect(&mut self) -> Result<AuthorizeInfo> {
        self.record(Call::Connect);
        self.connected = true;
        Ok(AuthorizeInfo {
            login_id: "TEST".to_string(),
            balance: dec!(1000),
            currency: "USD".to_string(),
        })
    }

    async fn start(&mut self, sender: mpsc::Sender<TransportEvent>) -> Result<()> {
        self.record(Call::Start);
        *self.sender.lock().unwrap() = Some(sender);
        Ok(())
    }

    async fn subscribe_ticks(&mut self, market: &str) -> Result<()> {
        self.record(Call::SubscribeTicks(market.to_string()));
        Ok(())
    }

    async fn submit_proposal(&mut self, config: &TradeConfig) -> Result<()> {
        self.record(Call::Proposal(config.clone()));
        let id = self.id("p");
        self.quotes.insert(id.clone(), config.clone());
        self.reply(TransportEvent::Proposal(Proposal {
            id,
            price: config.stake,
            payout: (config.stake * dec!(1.09)).round_dp(2),
        }))
    }

    async fn submit_buy(&mut self, proposal_id: &str, price: Decimal) -> Result<()> {
        self.record(Call::Buy {
            proposal_id: proposal_id.to_string(),
            price,
        });
        let Some(config) = self.quotes.remove(proposal_id) else {
            return Ok(());
        };
        let contract_id = self.id("c");
        self.contracts.insert(contract_id.clone(), config);
        self.reply(TransportEvent::Bought {
            contract_id,
            buy_price: price,
        })
    }

    async fn subscribe_contract(&mut self, contract_id: &str) -> Result<()> {
        self.record(Call::SubscribeContract(contract_id.to_string()));
        let Some(config) = self.contracts.remove(contract_id) else {
            return Ok(());
        };
        let payout = (config.stake * dec!(1.09)).round_dp(2);
        let scripted = self.outcomes.lock().unwrap().pop_front().flatten();
        let profit = scripted.unwrap_or(payout - config.stake);
        self.reply(TransportEvent::ContractUpdate(sold_contract(
            contract_id,
            &config,
            payout,
            profit,
        )))
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.record(Call::Disconnect);
        self.connected = false;
        *self.sender.lock().unwrap() = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn venue_name(&self) -> &'static str {
        "recording"
    }
}

/// Connected controller plus the far ends of its channels
pub struct Harness {
    pub controller: TradeController<RecordingTransport>,
    pub transport: RecordingTransport,
    pub inbound: mpsc::Receiver<TransportEvent>,
    pub events: mpsc::UnboundedReceiver<EngineEvent>,
}

impl Harness {
    pub async fn connect(transport: RecordingTransport, config: AppConfig) -> Self {
        let handle = transport.clone();
        let (event_tx, events) = create_engine_event_channel();
        let (sender, inbound) = create_transport_channel();
        let mut controller = TradeController::new(transport, config, event_tx);
        controller.connect(sender).await.unwrap();
        Self {
            controller,
            transport: handle,
            inbound,
            events,
        }
    }

    /// Deliver every queued transport reply, including replies to replies
    pub async fn pump(&mut self) {
        while let Ok(event) = self.inbound.try_recv() {
            self.controller.handle_transport_event(event).await;
        }
    }

    pub async fn feed(&mut self, digits: &[u8]) {
        for &digit in digits {
            self.controller.handle_transport_event(digit_tick(digit)).await;
        }
    }

    pub async fn cycle(&mut self) -> CycleOutcome {
        let outcome = self.controller.on_cycle().await;
        self.pump().await;
        outcome
    }
}

/// Configuration with the Rebound strategy and small, quick limits
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.strategy.active = StrategyKind::Rebound;
    config.engine.cycle_interval_ms = 1000;
    config.paper.seed = Some(42);
    config.paper.tick_interval_ms = 200;
    config
}

/// Tick event on `market`
pub fn tick(market: &str, quote: Decimal) -> TransportEvent {
    TransportEvent::Tick(Tick::new(market, quote))
}

/// Tick event on the default market whose quote ends in `digit`
pub fn digit_tick(digit: u8) -> TransportEvent {
    tick(MARKET, Decimal::new(10_000 + i64::from(digit), 1))
}

/// Settled contract for a trade config
pub fn sold_contract(id: &str, config: &TradeConfig, payout: Decimal, profit: Decimal) -> Contract {
    Contract {
        id: id.to_string(),
        contract_type: config.contract_type,
        market: config.market.clone(),
        target_digit: config.target_digit,
        buy_price: config.stake,
        payout,
        status: ContractStatus::Sold,
        is_sold: true,
        profit,
    }
}

/// Collect every engine event published so far
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
