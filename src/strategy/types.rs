use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::errors::{EngineError, Result};
use crate::common::types::ContractType;
use crate::config::types::{AppConfig, StrategySettings, TradeDefaults};

/// Strategy identifier
///
/// The strategy set is closed, so the active strategy is a tag rather than
/// an open registry key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Switcher,
    Rebound,
    Matches,
    Differs,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Switcher,
        StrategyKind::Rebound,
        StrategyKind::Matches,
        StrategyKind::Differs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Switcher => "switcher",
            StrategyKind::Rebound => "rebound",
            StrategyKind::Matches => "matches",
            StrategyKind::Differs => "differs",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "switcher" | "smart_switcher" => Ok(StrategyKind::Switcher),
            "rebound" => Ok(StrategyKind::Rebound),
            "matches" => Ok(StrategyKind::Matches),
            "differs" => Ok(StrategyKind::Differs),
            other => Err(EngineError::Configuration(format!("unknown strategy: {other}"))),
        }
    }
}

/// Mutually exclusive Matches sub-modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchesMode {
    /// Cycle through the prime digits
    #[default]
    Prime,
    /// Always the configured digit
    DigitMatch,
    /// Trade a digit seen repeating in recent ticks
    Echo,
    /// A fixed number of attempts per digit
    ThreeStrike,
}

/// Mutually exclusive Differs behaviours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffersMode {
    /// Most frequent digit of the last ten ticks
    #[default]
    Frequency,
    /// Fixed digit, pausing after a loss
    DigitShield,
    /// Recency-aware targeting when digits are spread out
    VolatilitySweep,
}

/// Read-only configuration handed to strategies on every call
///
/// Strategies never look anywhere else for settings.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub defaults: &'a TradeDefaults,
    pub initial_stake: Decimal,
    pub settings: &'a StrategySettings,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        defaults: &'a TradeDefaults,
        initial_stake: Decimal,
        settings: &'a StrategySettings,
    ) -> Self {
        Self {
            defaults,
            initial_stake,
            settings,
        }
    }

    pub fn from_config(config: &'a AppConfig) -> Self {
        Self::new(
            &config.trade,
            config.martingale.initial_stake,
            &config.strategy,
        )
    }
}

/// Result of switching the active strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub kind: StrategyKind,
    /// Contract type the strategy wants as the base default from now on
    pub preferred_contract_type: Option<ContractType>,
}
