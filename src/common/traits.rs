//! Trait definitions for venue transports

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use super::errors::Result;
use super::types::{AuthorizeInfo, TradeConfig, TransportEvent};

/// Duplex connection to a trading venue
///
/// The engine only issues requests through this trait. Every answer
/// (proposal, buy confirmation, contract update, error) arrives later as a
/// [`TransportEvent`] on the channel handed to [`Transport::start`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    /// Open the connection and authorize
    ///
    /// Fails with `EngineError::Authentication` when the venue rejects us.
    async fn connect(&mut self) -> Result<AuthorizeInfo>;

    /// Start forwarding venue notifications to the provided channel
    async fn start(&mut self, sender: mpsc::Sender<TransportEvent>) -> Result<()>;

    /// Subscribe to the tick stream of a market
    async fn subscribe_ticks(&mut self, market: &str) -> Result<()>;

    /// Request a price quote for a trade
    async fn submit_proposal(&mut self, config: &TradeConfig) -> Result<()>;

    /// Buy a previously quoted contract at the quoted price
    async fn submit_buy(&mut self, proposal_id: &str, price: Decimal) -> Result<()>;

    /// Subscribe to updates of a bought contract
    async fn subscribe_contract(&mut self, contract_id: &str) -> Result<()>;

    /// Gracefully disconnect from the venue
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the transport is currently connected
    fn is_connected(&self) -> bool;

    /// Get the name of the venue
    fn venue_name(&self) -> &'static str;
}
