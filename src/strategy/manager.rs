//! Owns one instance of every strategy and routes calls to the active one

use tracing::{info, warn};

use crate::common::types::TradeConfig;
use crate::market::TickHistory;
use crate::strategy::differs::Differs;
use crate::strategy::matches::Matches;
use crate::strategy::rebound::Rebound;
use crate::strategy::switcher::SmartSwitcher;
use crate::strategy::traits::Strategy;
use crate::strategy::types::{Activation, StrategyContext, StrategyKind};

/// Registry of the four strategies with exactly one active at a time
///
/// Inactive strategies keep their state untouched until they are activated
/// again or the manager is reset.
#[derive(Debug, Clone)]
pub struct StrategyManager {
    switcher: SmartSwitcher,
    rebound: Rebound,
    matches: Matches,
    differs: Differs,
    active: StrategyKind,
}

impl StrategyManager {
    pub fn new(active: StrategyKind) -> Self {
        Self {
            switcher: SmartSwitcher::new(),
            rebound: Rebound::new(),
            matches: Matches::new(),
            differs: Differs::new(),
            active,
        }
    }

    pub fn active(&self) -> StrategyKind {
        self.active
    }

    /// Activate a strategy by name
    ///
    /// Unknown names leave the current strategy active and return `None`.
    pub fn set_active(&mut self, name: &str, ctx: &StrategyContext<'_>) -> Option<Activation> {
        match name.parse::<StrategyKind>() {
            Ok(kind) => Some(self.activate(kind, ctx)),
            Err(err) => {
                warn!(name, error = %err, "ignoring unknown strategy");
                None
            }
        }
    }

    /// Make `kind` the active strategy and run its activation hook
    pub fn activate(&mut self, kind: StrategyKind, ctx: &StrategyContext<'_>) -> Activation {
        self.active = kind;
        let preferred_contract_type = self.strategy_mut(kind).on_activate(ctx);
        info!(
            strategy = %kind,
            preferred = ?preferred_contract_type,
            "strategy activated"
        );
        Activation {
            kind,
            preferred_contract_type,
        }
    }

    /// Let the active strategy shape the cycle's trade
    pub fn modify_trade_config(
        &mut self,
        config: TradeConfig,
        ticks: &TickHistory,
        ctx: &StrategyContext<'_>,
    ) -> Option<TradeConfig> {
        let active = self.active;
        self.strategy_mut(active)
            .modify_trade_config(config, ticks, ctx)
    }

    /// Report an outcome to the active strategy only
    pub fn on_trade_result(&mut self, won: bool, ctx: &StrategyContext<'_>) {
        let active = self.active;
        self.strategy_mut(active).on_trade_result(won, ctx);
    }

    /// Reset every strategy, active or not
    pub fn reset(&mut self) {
        for kind in StrategyKind::ALL {
            self.strategy_mut(kind).reset();
        }
    }

    pub fn switcher(&self) -> &SmartSwitcher {
        &self.switcher
    }

    pub fn rebound(&self) -> &Rebound {
        &self.rebound
    }

    pub fn matches(&self) -> &Matches {
        &self.matches
    }

    pub fn differs(&self) -> &Differs {
        &self.differs
    }

    fn strategy_mut(&mut self, kind: StrategyKind) -> &mut dyn Strategy {
        match kind {
            StrategyKind::Switcher => &mut self.switcher,
            StrategyKind::Rebound => &mut self.rebound,
            StrategyKind::Matches => &mut self.matches,
            StrategyKind::Differs => &mut self.differs,
        }
    }
}

impl Default for StrategyManager {
    fn default() -> Self {
        Self::new(StrategyKind::default())
    }
}
