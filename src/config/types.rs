//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{EngineError, Result};
use crate::common::types::{ContractType, Digit};
use crate::strategy::{DiffersMode, MatchesMode, StrategyKind};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base trade parameters every cycle starts from
    #[serde(default)]
    pub trade: TradeDefaults,
    /// Stake progression
    #[serde(default)]
    pub martingale: MartingaleConfig,
    /// Stop conditions
    #[serde(default)]
    pub risk: RiskConfig,
    /// Active strategy and per-strategy tunables
    #[serde(default)]
    pub strategy: StrategySettings,
    /// Scheduler and lifecycle settings
    #[serde(default)]
    pub engine: EngineSettings,
    /// Simulated venue settings
    #[serde(default)]
    pub paper: PaperConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Check every numeric knob the engine depends on
    pub fn validate(&self) -> Result<()> {
        self.trade.validate()?;
        self.martingale.validate()?;
        self.risk.validate()?;
        self.strategy.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::Configuration(message.into())
}

/// Operator-supplied defaults for every trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDefaults {
    #[serde(default = "default_contract_type")]
    pub contract_type: ContractType,
    #[serde(default = "default_target_digit")]
    pub target_digit: Digit,
    #[serde(default = "default_market")]
    pub market: String,
    #[serde(default = "default_duration_ticks")]
    pub duration_ticks: u32,
}

impl Default for TradeDefaults {
    fn default() -> Self {
        Self {
            contract_type: default_contract_type(),
            target_digit: default_target_digit(),
            market: default_market(),
            duration_ticks: default_duration_ticks(),
        }
    }
}

impl TradeDefaults {
    fn validate(&self) -> Result<()> {
        if self.market.trim().is_empty() {
            return Err(invalid("trade.market must not be empty"));
        }
        if self.duration_ticks == 0 {
            return Err(invalid("trade.duration_ticks must be at least 1"));
        }
        Ok(())
    }
}

fn default_contract_type() -> ContractType {
    ContractType::DigitDiff
}

fn default_target_digit() -> Digit {
    Digit::new(5).unwrap_or(Digit::ZERO)
}

fn default_market() -> String {
    "R_100".to_string()
}

fn default_duration_ticks() -> u32 {
    1
}

/// Martingale stake progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MartingaleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Stake of the first trade and of every restarted progression
    #[serde(default = "default_initial_stake")]
    pub initial_stake: Decimal,
    /// Number of stake levels in one progression, initial level included
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

impl Default for MartingaleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_stake: default_initial_stake(),
            max_steps: default_max_steps(),
        }
    }
}

impl MartingaleConfig {
    fn validate(&self) -> Result<()> {
        if self.initial_stake <= Decimal::ZERO {
            return Err(invalid("martingale.initial_stake must be positive"));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_initial_stake() -> Decimal {
    dec!(1)
}

fn default_max_steps() -> u32 {
    3
}

/// Stop conditions evaluated after every settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Stop once total P&L falls to minus this amount
    #[serde(default = "default_max_loss")]
    pub max_loss: Decimal,
    /// Stop once total P&L reaches this amount
    #[serde(default = "default_max_profit")]
    pub max_profit: Decimal,
    /// Stop after this many trades (0 = unlimited)
    #[serde(default)]
    pub max_trades: u32,
    /// Stop after this many consecutive losses
    #[serde(default = "default_loss_streak_limit")]
    pub loss_streak_limit: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_loss: default_max_loss(),
            max_profit: default_max_profit(),
            max_trades: 0,
            loss_streak_limit: default_loss_streak_limit(),
        }
    }
}

impl RiskConfig {
    fn validate(&self) -> Result<()> {
        if self.max_loss <= Decimal::ZERO {
            return Err(invalid("risk.max_loss must be positive"));
        }
        if self.max_profit <= Decimal::ZERO {
            return Err(invalid("risk.max_profit must be positive"));
        }
        if self.loss_streak_limit == 0 {
            return Err(invalid("risk.loss_streak_limit must be at least 1"));
        }
        Ok(())
    }
}

fn default_max_loss() -> Decimal {
    dec!(50)
}

fn default_max_profit() -> Decimal {
    dec!(100)
}

fn default_loss_streak_limit() -> u32 {
    5
}

/// Strategy selection and tunables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategySettings {
    #[serde(default)]
    pub active: StrategyKind,
    #[serde(default)]
    pub switcher: SwitcherSettings,
    #[serde(default)]
    pub matches: MatchesSettings,
    #[serde(default)]
    pub differs: DiffersSettings,
}

impl StrategySettings {
    fn validate(&self) -> Result<()> {
        self.switcher.validate()?;
        self.matches.validate()?;
        self.differs.validate()
    }
}

/// Smart Switcher axes, each enabled independently
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitcherSettings {
    #[serde(default)]
    pub digit_enabled: bool,
    #[serde(default = "default_one")]
    pub digit_win_interval: u32,
    #[serde(default = "default_three")]
    pub digit_loss_interval: u32,

    #[serde(default)]
    pub market_enabled: bool,
    #[serde(default = "default_three")]
    pub market_win_interval: u32,
    #[serde(default = "default_two")]
    pub market_loss_interval: u32,

    #[serde(default)]
    pub over_under_enabled: bool,
    #[serde(default = "default_under_digit")]
    pub under_digit: Digit,
    #[serde(default = "default_over_digit")]
    pub over_digit: Digit,
    #[serde(default = "default_two")]
    pub over_under_win_interval: u32,
    #[serde(default = "default_three")]
    pub over_under_loss_interval: u32,
    #[serde(default = "default_five")]
    pub over_under_trade_interval: u32,
}

impl Default for SwitcherSettings {
    fn default() -> Self {
        Self {
            digit_enabled: false,
            digit_win_interval: 1,
            digit_loss_interval: 3,
            market_enabled: false,
            market_win_interval: 3,
            market_loss_interval: 2,
            over_under_enabled: false,
            under_digit: default_under_digit(),
            over_digit: default_over_digit(),
            over_under_win_interval: 2,
            over_under_loss_interval: 3,
            over_under_trade_interval: 5,
        }
    }
}

impl SwitcherSettings {
    fn validate(&self) -> Result<()> {
        let intervals = [
            ("digit_win_interval", self.digit_win_interval),
            ("digit_loss_interval", self.digit_loss_interval),
            ("market_win_interval", self.market_win_interval),
            ("market_loss_interval", self.market_loss_interval),
            ("over_under_win_interval", self.over_under_win_interval),
            ("over_under_loss_interval", self.over_under_loss_interval),
            ("over_under_trade_interval", self.over_under_trade_interval),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(invalid(format!("strategy.switcher.{name} must be at least 1")));
            }
        }
        if self.under_digit == Digit::ZERO {
            return Err(invalid("strategy.switcher.under_digit must be 1..=9"));
        }
        if self.over_digit == Digit::NINE {
            return Err(invalid("strategy.switcher.over_digit must be 0..=8"));
        }
        Ok(())
    }
}

fn default_under_digit() -> Digit {
    Digit::new(5).unwrap_or(Digit::NINE)
}

fn default_over_digit() -> Digit {
    Digit::new(4).unwrap_or(Digit::ZERO)
}

/// Matches sub-mode and its knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchesSettings {
    #[serde(default)]
    pub mode: MatchesMode,
    /// Consecutive wins before the prime rotation advances
    #[serde(default = "default_two")]
    pub prime_switch_wins: u32,
    #[serde(default = "default_target_digit")]
    pub match_digit: Digit,
    #[serde(default = "default_echo_window")]
    pub echo_observe_ticks: usize,
    #[serde(default = "default_three")]
    pub echo_max_losses: u32,
    #[serde(default = "default_three")]
    pub strike_max_attempts: u32,
}

impl Default for MatchesSettings {
    fn default() -> Self {
        Self {
            mode: MatchesMode::default(),
            prime_switch_wins: 2,
            match_digit: default_target_digit(),
            echo_observe_ticks: 5,
            echo_max_losses: 3,
            strike_max_attempts: 3,
        }
    }
}

impl MatchesSettings {
    fn validate(&self) -> Result<()> {
        if self.prime_switch_wins == 0 {
            return Err(invalid("strategy.matches.prime_switch_wins must be at least 1"));
        }
        if self.echo_observe_ticks < 2 {
            return Err(invalid("strategy.matches.echo_observe_ticks must be at least 2"));
        }
        if self.echo_max_losses == 0 {
            return Err(invalid("strategy.matches.echo_max_losses must be at least 1"));
        }
        if self.strike_max_attempts == 0 {
            return Err(invalid("strategy.matches.strike_max_attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Differs behaviour and its knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffersSettings {
    #[serde(default)]
    pub mode: DiffersMode,
    #[serde(default = "default_target_digit")]
    pub shield_digit: Digit,
    /// Cycles skipped after a loss in Digit Shield mode
    #[serde(default = "default_three")]
    pub shield_pause_ticks: u32,
}

impl Default for DiffersSettings {
    fn default() -> Self {
        Self {
            mode: DiffersMode::default(),
            shield_digit: default_target_digit(),
            shield_pause_ticks: 3,
        }
    }
}

impl DiffersSettings {
    fn validate(&self) -> Result<()> {
        if self.shield_pause_ticks == 0 {
            return Err(invalid("strategy.differs.shield_pause_ticks must be at least 1"));
        }
        Ok(())
    }
}

fn default_one() -> u32 {
    1
}

fn default_two() -> u32 {
    2
}

fn default_three() -> u32 {
    3
}

fn default_five() -> u32 {
    5
}

fn default_echo_window() -> usize {
    5
}

/// Scheduler and order lifecycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Period of the trading cycle in milliseconds
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_ms: u64,
    /// Ticks that must be buffered before trading may start
    #[serde(default = "default_min_ticks")]
    pub min_ticks: usize,
    /// Abort a proposal or buy that sees no answer for this long
    #[serde(default = "default_pending_timeout")]
    pub pending_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cycle_interval_ms: default_cycle_interval(),
            min_ticks: default_min_ticks(),
            pending_timeout_secs: default_pending_timeout(),
        }
    }
}

impl EngineSettings {
    fn validate(&self) -> Result<()> {
        if self.cycle_interval_ms == 0 {
            return Err(invalid("engine.cycle_interval_ms must be positive"));
        }
        if self.pending_timeout_secs == 0 {
            return Err(invalid("engine.pending_timeout_secs must be positive"));
        }
        Ok(())
    }
}

fn default_cycle_interval() -> u64 {
    6000
}

fn default_min_ticks() -> usize {
    5
}

fn default_pending_timeout() -> u64 {
    60
}

/// Simulated venue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperConfig {
    /// Delay between generated ticks in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Account balance at connect
    #[serde(default = "default_start_balance")]
    pub start_balance: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// First quote of every simulated market
    #[serde(default = "default_start_quote")]
    pub start_quote: Decimal,
    /// Fraction of fair payout kept by the venue
    #[serde(default = "default_house_margin")]
    pub house_margin: Decimal,
    /// Optional RNG seed for reproducible sessions
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            start_balance: default_start_balance(),
            currency: default_currency(),
            start_quote: default_start_quote(),
            house_margin: default_house_margin(),
            seed: None,
        }
    }
}

fn default_tick_interval() -> u64 {
    1000
}

fn default_start_balance() -> Decimal {
    dec!(1000)
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_start_quote() -> Decimal {
    dec!(1000.00)
}

fn default_house_margin() -> Decimal {
    dec!(0.05)
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
