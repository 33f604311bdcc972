//! Trading engine: staking, risk, session bookkeeping and the trade
//! lifecycle
//!
//! # Components
//!
//! - [`TradeController`]: the one-trade-at-a-time state machine
//! - [`EngineRunner`]: async loop feeding the controller with cycle triggers,
//!   transport events and [`EngineCommand`]s
//! - [`StakingPolicy`]: martingale stake progression
//! - [`RiskGuard`]: post-settlement stop conditions
//! - [`SessionStats`]: running totals and the trade log

pub mod controller;
pub mod risk;
pub mod runner;
pub mod session;
pub mod staking;

pub use controller::{CycleOutcome, PendingTrade, TradeController, TradePhase};
pub use risk::{RiskGuard, StopReason};
pub use runner::{EngineCommand, EngineRunner};
pub use session::{SessionStats, TRADE_LOG_CAPACITY};
pub use staking::{StakeState, StakingPolicy};
