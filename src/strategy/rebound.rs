//! Rebound: DIGITDIFF until a loss, then DIGITOVER at double stake until a win

use rust_decimal::Decimal;
use tracing::info;

use crate::common::types::{ContractType, TradeConfig};
use crate::market::TickHistory;
use crate::strategy::traits::Strategy;
use crate::strategy::types::{StrategyContext, StrategyKind};

#[derive(Debug, Clone, Default)]
pub struct Rebound {
    recovery: bool,
}

impl Rebound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recovery(&self) -> bool {
        self.recovery
    }
}

impl Strategy for Rebound {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rebound
    }

    fn modify_trade_config(
        &mut self,
        mut config: TradeConfig,
        _ticks: &TickHistory,
        ctx: &StrategyContext<'_>,
    ) -> Option<TradeConfig> {
        if self.recovery {
            config.contract_type = ContractType::DigitOver;
            // fixed at twice the initial stake, the engine's martingale is separate
            config.stake = ctx.initial_stake * Decimal::TWO;
        } else {
            config.contract_type = ContractType::DigitDiff;
        }
        Some(config)
    }

    fn on_trade_result(&mut self, won: bool, _ctx: &StrategyContext<'_>) {
        match (self.recovery, won) {
            (false, false) => {
                self.recovery = true;
                info!("rebound entering recovery");
            }
            (true, true) => {
                self.recovery = false;
                info!("rebound recovered");
            }
            _ => {}
        }
    }

    fn on_activate(&mut self, _ctx: &StrategyContext<'_>) -> Option<ContractType> {
        Some(ContractType::DigitDiff)
    }

    fn reset(&mut self) {
        self.recovery = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Digit;
    use crate::config::types::AppConfig;
    use rust_decimal_macros::dec;

    fn base_config() -> TradeConfig {
        TradeConfig {
            contract_type: ContractType::DigitMatch,
            target_digit: Digit::new(3),
            stake: dec!(4),
            market: "R_100".to_string(),
            duration_ticks: 1,
        }
    }

    #[test]
    fn test_normal_trades_differs() {
        let app = AppConfig::default();
        let ctx = StrategyContext::from_config(&app);
        let mut rebound = Rebound::new();

        let config = rebound
            .modify_trade_config(base_config(), &TickHistory::new(), &ctx)
            .unwrap();
        assert_eq!(config.contract_type, ContractType::DigitDiff);
        assert_eq!(config.stake, dec!(4));
        assert_eq!(config.target_digit, Digit::new(3));
    }

    #[test]
    fn test_loss_enters_recovery_at_double_initial_stake() {
        let mut app = AppConfig::default();
        app.martingale.initial_stake = dec!(1.5);
        let ctx = StrategyContext::from_config(&app);
        let mut rebound = Rebound::new();

        rebound.on_trade_result(false, &ctx);
        assert!(rebound.is_recovery());

        let config = rebound
            .modify_trade_config(base_config(), &TickHistory::new(), &ctx)
            .unwrap();
        assert_eq!(config.contract_type, ContractType::DigitOver);
        assert_eq!(config.stake, dec!(3.0));
        assert_eq!(config.target_digit, Digit::new(3));
    }

    #[test]
    fn test_recovery_exits_only_on_win() {
        let app = AppConfig::default();
        let ctx = StrategyContext::from_config(&app);
        let mut rebound = Rebound::new();

        rebound.on_trade_result(true, &ctx);
        assert!(!rebound.is_recovery());

        rebound.on_trade_result(false, &ctx);
        rebound.on_trade_result(false, &ctx);
        assert!(rebound.is_recovery());

        rebound.on_trade_result(true, &ctx);
        assert!(!rebound.is_recovery());
    }

    #[test]
    fn test_activation_prefers_differs() {
        let app = AppConfig::default();
        let ctx = StrategyContext::from_config(&app);
        let mut rebound = Rebound::new();
        rebound.on_trade_result(false, &ctx);

        assert_eq!(rebound.on_activate(&ctx), Some(ContractType::DigitDiff));
        rebound.reset();
        assert!(!rebound.is_recovery());
    }
}
