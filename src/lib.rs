//! DigitTrader Library
//!
//! Decision and order-lifecycle engine for automated last-digit trading
//! against a tick stream: pluggable strategies, martingale staking, risk
//! stops and a one-trade-at-a-time controller behind a venue-agnostic
//! transport.

pub mod common;
pub mod config;
pub mod engine;
pub mod market;
pub mod paper;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{EngineError, Result};
pub use common::traits::Transport;
pub use common::types::{
    Contract, ContractStatus, ContractType, Digit, EngineEvent, Proposal, StatsSnapshot, Tick,
    TradeConfig, TradeRecord, TransportEvent, VenueError,
};
pub use config::types::AppConfig;
pub use engine::{
    CycleOutcome, EngineCommand, EngineRunner, RiskGuard, SessionStats, StakeState,
    StakingPolicy, StopReason, TradeController, TradePhase,
};
pub use market::TickHistory;
pub use paper::PaperVenue;

// Strategy types
pub use strategy::{
    Differs, Matches, Rebound, SmartSwitcher, Strategy, StrategyContext, StrategyKind,
    StrategyManager,
};
