//! Core domain types shared by the engine, strategies and transports

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::{EngineError, Result};
use crate::strategy::StrategyKind;

/// A single decimal digit in 0..=9, the unit every strategy predicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    pub const ZERO: Digit = Digit(0);
    pub const NINE: Digit = Digit(9);

    /// Create a digit, returning None outside 0..=9
    pub fn new(value: u8) -> Option<Self> {
        (value <= 9).then_some(Self(value))
    }

    /// Underlying value
    pub fn value(self) -> u8 {
        self.0
    }

    /// Next digit, wrapping 9 back to 0
    pub fn next(self) -> Self {
        Self((self.0 + 1) % 10)
    }

    pub fn is_even(self) -> bool {
        self.0 % 2 == 0
    }

    /// Extract the last decimal digit of a price quote
    ///
    /// The quote is normalised first so `1234.50` yields `5`, the same
    /// digit a trader reads off the rendered price.
    pub fn from_quote(quote: Decimal) -> Self {
        quote
            .normalize()
            .to_string()
            .bytes()
            .last()
            .filter(u8::is_ascii_digit)
            .map_or(Self::ZERO, |b| Self(b - b'0'))
    }
}

impl TryFrom<u8> for Digit {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self> {
        Digit::new(value)
            .ok_or_else(|| EngineError::Configuration(format!("digit out of range: {value}")))
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contract types offered by the venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractType {
    DigitOver,
    DigitUnder,
    DigitMatch,
    DigitDiff,
    DigitEven,
    DigitOdd,
    Call,
    Put,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::DigitOver => "DIGITOVER",
            ContractType::DigitUnder => "DIGITUNDER",
            ContractType::DigitMatch => "DIGITMATCH",
            ContractType::DigitDiff => "DIGITDIFF",
            ContractType::DigitEven => "DIGITEVEN",
            ContractType::DigitOdd => "DIGITODD",
            ContractType::Call => "CALL",
            ContractType::Put => "PUT",
        }
    }

    /// Whether the contract is priced against a target digit (barrier)
    pub fn requires_barrier(&self) -> bool {
        matches!(
            self,
            ContractType::DigitOver
                | ContractType::DigitUnder
                | ContractType::DigitMatch
                | ContractType::DigitDiff
        )
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "DIGITOVER" => Ok(ContractType::DigitOver),
            "DIGITUNDER" => Ok(ContractType::DigitUnder),
            "DIGITMATCH" => Ok(ContractType::DigitMatch),
            "DIGITDIFF" => Ok(ContractType::DigitDiff),
            "DIGITEVEN" => Ok(ContractType::DigitEven),
            "DIGITODD" => Ok(ContractType::DigitOdd),
            "CALL" => Ok(ContractType::Call),
            "PUT" => Ok(ContractType::Put),
            other => Err(EngineError::Configuration(format!(
                "unknown contract type: {other}"
            ))),
        }
    }
}

/// Parameters of one trade, produced fresh every cycle and then shaped by
/// the active strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeConfig {
    pub contract_type: ContractType,
    pub target_digit: Option<Digit>,
    pub stake: Decimal,
    pub market: String,
    pub duration_ticks: u32,
}

impl TradeConfig {
    /// Reject configurations the venue could never price
    pub fn validate(&self) -> Result<()> {
        if self.stake <= Decimal::ZERO {
            return Err(EngineError::Configuration(format!(
                "stake must be positive, got {}",
                self.stake
            )));
        }
        if self.duration_ticks == 0 {
            return Err(EngineError::Configuration(
                "duration must be at least one tick".to_string(),
            ));
        }
        if self.market.trim().is_empty() {
            return Err(EngineError::Configuration("market is empty".to_string()));
        }
        if self.contract_type.requires_barrier() && self.target_digit.is_none() {
            return Err(EngineError::Configuration(format!(
                "{} needs a target digit",
                self.contract_type
            )));
        }
        Ok(())
    }
}

/// One price update from the market feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub market: String,
    pub quote: Decimal,
    pub epoch: DateTime<Utc>,
}

impl Tick {
    pub fn new(market: impl Into<String>, quote: Decimal) -> Self {
        Self {
            market: market.into(),
            quote,
            epoch: Utc::now(),
        }
    }

    pub fn digit(&self) -> Digit {
        Digit::from_quote(self.quote)
    }
}

/// Price quote for a prospective contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    /// Price to pay when buying
    pub price: Decimal,
    /// Amount returned on a win
    pub payout: Decimal,
}

/// Business or protocol error reported by the venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueError {
    pub code: String,
    pub message: String,
}

impl VenueError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for VenueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Lifecycle status of a bought contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Open,
    Sold,
}

/// A placed order tracked until settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub contract_type: ContractType,
    pub market: String,
    pub target_digit: Option<Digit>,
    pub buy_price: Decimal,
    pub payout: Decimal,
    pub status: ContractStatus,
    /// Venue's explicit sold flag, may be set without a status change
    #[serde(default)]
    pub is_sold: bool,
    pub profit: Decimal,
}

impl Contract {
    /// A contract is terminal once either the status or the sold flag says so
    pub fn is_settled(&self) -> bool {
        self.status == ContractStatus::Sold || self.is_sold
    }
}

/// Connection status for a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Successfully connected
    Connected,
    /// Disconnected (with optional reason)
    Disconnected(Option<String>),
    /// Connection error
    Error(String),
}

/// Account details returned by a successful authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeInfo {
    pub login_id: String,
    pub balance: Decimal,
    pub currency: String,
}

/// Typed notification produced by a transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Tick(Tick),
    Balance { amount: Decimal, currency: String },
    Proposal(Proposal),
    ProposalError(VenueError),
    Bought { contract_id: String, buy_price: Decimal },
    BuyError(VenueError),
    ContractUpdate(Contract),
    Error(VenueError),
    ConnectionStatus(ConnectionStatus),
}

/// Immutable snapshot of a settled trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub time: DateTime<Utc>,
    pub contract_id: String,
    pub contract_type: ContractType,
    pub market: String,
    pub target_digit: Option<Digit>,
    pub stake: Decimal,
    pub payout: Decimal,
    pub won: bool,
    pub profit: Decimal,
    pub martingale_step: u32,
    pub strategy: StrategyKind,
}

/// Session statistics as shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_pnl: Decimal,
    pub total_trades: u32,
    pub wins: u32,
    pub losses: u32,
    /// Percentage rounded to one decimal place
    pub win_rate: Decimal,
    pub consecutive_losses: u32,
    pub current_stake: Decimal,
    pub martingale_step: u32,
}

/// Notifications the engine publishes for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum EngineEvent {
    StatsUpdate(StatsSnapshot),
    TradeComplete(TradeRecord),
    TradingStarted,
    TradingStop { reason: String },
    TradeSubmitted(TradeConfig),
    TradeAborted { reason: String },
    SessionReset,
    Balance { amount: Decimal, currency: String },
    StrategyChanged { strategy: StrategyKind },
    Failure { action: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_digit_from_quote() {
        assert_eq!(Digit::from_quote(dec!(1234.57)), Digit(7));
        assert_eq!(Digit::from_quote(dec!(1234.50)), Digit(5));
        assert_eq!(Digit::from_quote(dec!(1230)), Digit(0));
        assert_eq!(Digit::from_quote(dec!(0.001)), Digit(1));
    }

    #[test]
    fn test_digit_bounds_and_wrap() {
        assert!(Digit::new(10).is_none());
        assert_eq!(Digit::new(9), Some(Digit::NINE));
        assert_eq!(Digit::NINE.next(), Digit::ZERO);
        assert!(Digit::try_from(11u8).is_err());
    }

    #[test]
    fn test_contract_type_parsing() {
        assert_eq!("digitdiff".parse::<ContractType>().unwrap(), ContractType::DigitDiff);
        assert_eq!(ContractType::DigitOver.to_string(), "DIGITOVER");
        assert!("DIGITMAYBE".parse::<ContractType>().is_err());

        let json = serde_json::to_string(&ContractType::DigitMatch).unwrap();
        assert_eq!(json, "\"DIGITMATCH\"");
    }

    #[test]
    fn test_trade_config_validation() {
        let mut config = TradeConfig {
            contract_type: ContractType::DigitMatch,
            target_digit: Digit::new(3),
            stake: dec!(1),
            market: "R_100".to_string(),
            duration_ticks: 1,
        };
        assert!(config.validate().is_ok());

        config.target_digit = None;
        assert!(config.validate().is_err());

        config.contract_type = ContractType::DigitEven;
        assert!(config.validate().is_ok());

        config.stake = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_contract_settled_by_flag_or_status() {
        let mut contract = Contract {
            id: "c1".to_string(),
            contract_type: ContractType::DigitDiff,
            market: "R_100".to_string(),
            target_digit: Digit::new(4),
            buy_price: dec!(1),
            payout: dec!(1.09),
            status: ContractStatus::Open,
            is_sold: false,
            profit: Decimal::ZERO,
        };
        assert!(!contract.is_settled());

        contract.is_sold = true;
        assert!(contract.is_settled());

        contract.is_sold = false;
        contract.status = ContractStatus::Sold;
        assert!(contract.is_settled());
    }

    #[test]
    fn test_engine_event_serialization() {
        let event = EngineEvent::TradingStop {
            reason: "Max loss reached".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "tradingStop");
        assert_eq!(json["data"]["reason"], "Max loss reached");
    }
}
