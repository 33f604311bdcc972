//! Strategy module for trade decision making
//!
//! Strategies turn the operator's default trade into the trade actually
//! submitted each cycle, and learn from every settled outcome.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CYCLE (every interval)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TradeConfig from operator defaults + current stake         │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  StrategyManager → active Strategy.modify_trade_config()    │
//! │       │                                                     │
//! │       ▼ (Some)                          (None) → skip cycle │
//! │  Controller submits the proposal                            │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SETTLEMENT                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Contract sold → won = profit > 0                           │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  StrategyManager → active Strategy.on_trade_result(won)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`Strategy`]: Capability set every strategy implements
//! - [`StrategyManager`]: Holds all four strategies, routes to the active one
//! - [`StrategyContext`]: Read-only settings provided to strategies
//! - [`SmartSwitcher`], [`Rebound`], [`Matches`], [`Differs`]: the strategies

mod types;
mod traits;
mod manager;
mod switcher;
mod rebound;
mod matches;
mod differs;
pub mod digit_stats;

pub use types::{Activation, DiffersMode, MatchesMode, StrategyContext, StrategyKind};

pub use traits::Strategy;

pub use manager::StrategyManager;

pub use switcher::{OverUnderMode, SmartSwitcher, SWITCHER_MARKETS};
pub use rebound::Rebound;
pub use matches::{Matches, PRIME_DIGITS};
pub use differs::{Differs, DIFFERS_WINDOW, VOLATILE_DISTINCT_DIGITS};
