use crate::common::types::{ContractType, TradeConfig};
use crate::market::TickHistory;
use crate::strategy::types::{StrategyContext, StrategyKind};

/// Capability set shared by every strategy
///
/// Strategies shape the per-cycle trade and react to outcomes. They own
/// their internal state and receive everything else as arguments.
///
/// # Implementation Notes
///
/// - `modify_trade_config` must be fast, no blocking I/O
/// - Returning `None` vetoes the cycle; this is not an error
/// - Only the active strategy is ever called, inactive ones stay frozen
pub trait Strategy: Send + Sync {
    /// Which strategy this is
    fn kind(&self) -> StrategyKind;

    /// Shape the trade for this cycle
    ///
    /// # Arguments
    /// * `config` - Fresh trade built from operator defaults
    /// * `ticks` - Recent ticks of the subscribed market
    /// * `ctx` - Strategy settings and defaults
    ///
    /// # Returns
    /// * `Some(config)` - Trade to submit
    /// * `None` - Skip this cycle
    fn modify_trade_config(
        &mut self,
        config: TradeConfig,
        ticks: &TickHistory,
        ctx: &StrategyContext<'_>,
    ) -> Option<TradeConfig>;

    /// Called once per settled trade placed while this strategy was active
    fn on_trade_result(&mut self, won: bool, ctx: &StrategyContext<'_>);

    /// Called when the strategy becomes active
    ///
    /// May return the contract type the operator defaults should switch to.
    /// Default implementation keeps the current default.
    fn on_activate(&mut self, _ctx: &StrategyContext<'_>) -> Option<ContractType> {
        None
    }

    /// Forget all internal progress
    fn reset(&mut self);
}
