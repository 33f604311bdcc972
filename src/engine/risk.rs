//! Post-settlement stop conditions

use rust_decimal::Decimal;
use std::fmt;

use crate::config::types::RiskConfig;
use crate::engine::session::SessionStats;

/// Why trading was halted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    LossStreak(u32),
    MaxLoss,
    ProfitTarget,
    TradeLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::LossStreak(n) => write!(f, "{n} consecutive losses"),
            StopReason::MaxLoss => f.write_str("Max loss reached"),
            StopReason::ProfitTarget => f.write_str("Profit target reached!"),
            StopReason::TradeLimit => f.write_str("Trade limit reached"),
        }
    }
}

/// Evaluates stop conditions after every settlement
///
/// Checks run in priority order and the first one that trips wins:
/// 1. Consecutive loss streak
/// 2. Max loss
/// 3. Profit target
/// 4. Trade count limit (0 disables it)
#[derive(Debug, Clone, Copy)]
pub struct RiskGuard<'a> {
    config: &'a RiskConfig,
}

impl<'a> RiskGuard<'a> {
    pub fn new(config: &'a RiskConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, stats: &SessionStats) -> Option<StopReason> {
        // 1. Loss streak
        if stats.consecutive_losses() >= self.config.loss_streak_limit {
            return Some(StopReason::LossStreak(stats.consecutive_losses()));
        }

        let pnl = stats.total_pnl();

        // 2. Max loss
        if pnl < Decimal::ZERO && pnl.abs() >= self.config.max_loss {
            return Some(StopReason::MaxLoss);
        }

        // 3. Profit target
        if pnl >= self.config.max_profit {
            return Some(StopReason::ProfitTarget);
        }

        // 4. Trade limit
        if self.config.max_trades > 0 && stats.total_trades() >= self.config.max_trades {
            return Some(StopReason::TradeLimit);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn risk(max_loss: Decimal, max_profit: Decimal, max_trades: u32, streak: u32) -> RiskConfig {
        RiskConfig {
            max_loss,
            max_profit,
            max_trades,
            loss_streak_limit: streak,
        }
    }

    fn stats_after(profits: &[Decimal]) -> SessionStats {
        let mut stats = SessionStats::new();
        for &profit in profits {
            stats.record_result(profit);
        }
        stats
    }

    #[test]
    fn test_loss_streak_has_priority_over_max_loss() {
        let config = risk(dec!(10), dec!(100), 0, 3);
        let guard = RiskGuard::new(&config);

        let stats = stats_after(&[dec!(-4), dec!(-4), dec!(-4)]);
        let reason = guard.evaluate(&stats).unwrap();
        assert_eq!(reason, StopReason::LossStreak(3));
        assert_eq!(reason.to_string(), "3 consecutive losses");
    }

    #[test]
    fn test_max_loss_is_inclusive() {
        let config = risk(dec!(10), dec!(100), 0, 5);
        let guard = RiskGuard::new(&config);

        let stats = stats_after(&[dec!(-5), dec!(0.5), dec!(-5.5)]);
        assert_eq!(guard.evaluate(&stats), Some(StopReason::MaxLoss));

        let stats = stats_after(&[dec!(-5), dec!(0.5), dec!(-5.49)]);
        assert_eq!(guard.evaluate(&stats), None);
    }

    #[test]
    fn test_profit_target() {
        let config = risk(dec!(10), dec!(2), 0, 5);
        let guard = RiskGuard::new(&config);

        let stats = stats_after(&[dec!(0.95), dec!(0.95)]);
        assert_eq!(guard.evaluate(&stats), None);

        let stats = stats_after(&[dec!(0.95), dec!(0.95), dec!(0.95)]);
        let reason = guard.evaluate(&stats).unwrap();
        assert_eq!(reason.to_string(), "Profit target reached!");
    }

    #[test]
    fn test_trade_limit_zero_means_unlimited() {
        let config = risk(dec!(100), dec!(100), 0, 5);
        let guard = RiskGuard::new(&config);
        let stats = stats_after(&[dec!(0.1); 40]);
        assert_eq!(guard.evaluate(&stats), None);

        let config = risk(dec!(100), dec!(100), 2, 5);
        let guard = RiskGuard::new(&config);
        let stats = stats_after(&[dec!(0.1), dec!(-0.1)]);
        assert_eq!(guard.evaluate(&stats), Some(StopReason::TradeLimit));
    }
}
