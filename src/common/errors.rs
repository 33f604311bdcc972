//! Error types for the engine

use thiserror::Error;

/// Result type alias using our EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Connect/send failures reported by the transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// The venue rejected our credentials
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// An operation needed a live transport connection
    #[error("Not connected to venue")]
    NotConnected,

    /// The venue refused to quote the requested contract
    #[error("Proposal rejected ({code}): {message}")]
    ProposalRejected { code: String, message: String },

    /// The venue refused to fill a quoted contract
    #[error("Buy rejected ({code}): {message}")]
    BuyRejected { code: String, message: String },

    /// Missing or invalid numeric configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Trading cannot start before enough ticks are buffered
    #[error("Waiting for tick data: have {have} ticks, need {need}")]
    InsufficientTicks { have: usize, need: usize },

    /// Another trade is still in flight
    #[error("A trade is already in flight")]
    TradeInFlight,

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Channel send errors
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Channel receive errors
    #[error("Channel receive error: {0}")]
    ChannelReceive(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether this error aborts only the current trade and leaves the
    /// session able to continue on the next cycle
    pub fn is_trade_scoped(&self) -> bool {
        matches!(
            self,
            EngineError::ProposalRejected { .. }
                | EngineError::BuyRejected { .. }
                | EngineError::Configuration(_)
                | EngineError::Timeout(_)
        )
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for EngineError {
    fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
        EngineError::ChannelSend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_trade_scoped() {
        let err = EngineError::ProposalRejected {
            code: "InvalidBarrier".to_string(),
            message: "barrier out of range".to_string(),
        };
        assert!(err.is_trade_scoped());
        assert_eq!(
            err.to_string(),
            "Proposal rejected (InvalidBarrier): barrier out of range"
        );

        assert!(!EngineError::NotConnected.is_trade_scoped());
        assert!(!EngineError::Authentication("bad token".into()).is_trade_scoped());
    }

    #[test]
    fn test_insufficient_ticks_message() {
        let err = EngineError::InsufficientTicks { have: 2, need: 5 };
        assert_eq!(err.to_string(), "Waiting for tick data: have 2 ticks, need 5");
    }
}
