//! Smart Switcher: rotates digit, market and over/under direction

use serde::Serialize;
use tracing::{debug, info};

use crate::common::types::{ContractType, Digit, TradeConfig};
use crate::market::TickHistory;
use crate::strategy::traits::Strategy;
use crate::strategy::types::{StrategyContext, StrategyKind};

/// Markets the switcher rotates through, in order
pub const SWITCHER_MARKETS: [&str; 5] = ["R_10", "R_25", "R_50", "R_75", "R_100"];

/// Direction currently traded by the over/under axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverUnderMode {
    Under,
    Over,
}

impl OverUnderMode {
    fn toggled(self) -> Self {
        match self {
            OverUnderMode::Under => OverUnderMode::Over,
            OverUnderMode::Over => OverUnderMode::Under,
        }
    }
}

/// Win/loss streak counter for one rotation axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StreakCounter {
    wins: u32,
    losses: u32,
}

impl StreakCounter {
    /// Record an outcome; true when either streak reached its interval
    fn record(&mut self, won: bool, win_interval: u32, loss_interval: u32) -> bool {
        if won {
            self.wins += 1;
            self.losses = 0;
            if self.wins >= win_interval {
                self.wins = 0;
                return true;
            }
        } else {
            self.losses += 1;
            self.wins = 0;
            if self.losses >= loss_interval {
                self.losses = 0;
                return true;
            }
        }
        false
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Rotates among three independently enabled axes
///
/// - digit: advances by one after N wins or M losses
/// - market: steps through [`SWITCHER_MARKETS`] after N wins or M losses
/// - over/under: flips direction after N wins, M losses or T trades,
///   all three counters restart whenever one fires
///
/// When over/under is enabled it owns the target digit and the digit axis
/// is not applied.
#[derive(Debug, Clone)]
pub struct SmartSwitcher {
    digit_streak: StreakCounter,
    market_streak: StreakCounter,
    over_under_streak: StreakCounter,
    trades_since_flip: u32,
    current_digit: Digit,
    market_index: usize,
    over_under_mode: OverUnderMode,
}

impl SmartSwitcher {
    pub fn new() -> Self {
        Self {
            digit_streak: StreakCounter::default(),
            market_streak: StreakCounter::default(),
            over_under_streak: StreakCounter::default(),
            trades_since_flip: 0,
            current_digit: Digit::new(5).unwrap_or(Digit::ZERO),
            market_index: 0,
            over_under_mode: OverUnderMode::Under,
        }
    }

    pub fn current_digit(&self) -> Digit {
        self.current_digit
    }

    pub fn current_market(&self) -> &'static str {
        SWITCHER_MARKETS[self.market_index]
    }

    pub fn over_under_mode(&self) -> OverUnderMode {
        self.over_under_mode
    }

    pub fn trades_since_flip(&self) -> u32 {
        self.trades_since_flip
    }

    fn record_over_under(&mut self, won: bool, ctx: &StrategyContext<'_>) {
        let settings = &ctx.settings.switcher;
        self.trades_since_flip += 1;

        let streak_fired = self.over_under_streak.record(
            won,
            settings.over_under_win_interval,
            settings.over_under_loss_interval,
        );
        let trades_fired = self.trades_since_flip >= settings.over_under_trade_interval;

        if streak_fired || trades_fired {
            self.over_under_mode = self.over_under_mode.toggled();
            self.over_under_streak.clear();
            self.trades_since_flip = 0;
            info!(mode = ?self.over_under_mode, "switcher flipped over/under direction");
        }
    }
}

impl Default for SmartSwitcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for SmartSwitcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Switcher
    }

    fn modify_trade_config(
        &mut self,
        mut config: TradeConfig,
        _ticks: &TickHistory,
        ctx: &StrategyContext<'_>,
    ) -> Option<TradeConfig> {
        let settings = &ctx.settings.switcher;

        if settings.over_under_enabled {
            let (contract_type, digit) = match self.over_under_mode {
                OverUnderMode::Under => (ContractType::DigitUnder, settings.under_digit),
                OverUnderMode::Over => (ContractType::DigitOver, settings.over_digit),
            };
            config.contract_type = contract_type;
            config.target_digit = Some(digit);
        } else if settings.digit_enabled {
            config.target_digit = Some(self.current_digit);
        }

        if settings.market_enabled {
            config.market = self.current_market().to_string();
        }

        debug!(
            contract_type = %config.contract_type,
            target = ?config.target_digit,
            market = %config.market,
            "switcher shaped trade"
        );
        Some(config)
    }

    fn on_trade_result(&mut self, won: bool, ctx: &StrategyContext<'_>) {
        let settings = &ctx.settings.switcher;

        if settings.over_under_enabled {
            self.record_over_under(won, ctx);
        }

        if settings.digit_enabled
            && self.digit_streak.record(
                won,
                settings.digit_win_interval,
                settings.digit_loss_interval,
            )
        {
            self.current_digit = self.current_digit.next();
            info!(digit = %self.current_digit, "switcher rotated digit");
        }

        if settings.market_enabled
            && self.market_streak.record(
                won,
                settings.market_win_interval,
                settings.market_loss_interval,
            )
        {
            self.market_index = (self.market_index + 1) % SWITCHER_MARKETS.len();
            info!(market = self.current_market(), "switcher rotated market");
        }
    }

    fn on_activate(&mut self, ctx: &StrategyContext<'_>) -> Option<ContractType> {
        self.current_digit = ctx.defaults.target_digit;
        None
    }

    fn reset(&mut self) {
        self.digit_streak.clear();
        self.market_streak.clear();
        self.over_under_streak.clear();
        self.trades_since_flip = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::AppConfig;
    use rust_decimal_macros::dec;

    fn base_config() -> TradeConfig {
        TradeConfig {
            contract_type: ContractType::DigitDiff,
            target_digit: Digit::new(5),
            stake: dec!(1),
            market: "R_100".to_string(),
            duration_ticks: 1,
        }
    }

    #[test]
    fn test_disabled_axes_leave_config_alone() {
        let app = AppConfig::default();
        let ctx = StrategyContext::from_config(&app);
        let mut switcher = SmartSwitcher::new();

        let config = switcher
            .modify_trade_config(base_config(), &TickHistory::new(), &ctx)
            .unwrap();
        assert_eq!(config, base_config());
    }

    #[test]
    fn test_digit_rotates_after_wins_and_losses() {
        let mut app = AppConfig::default();
        app.strategy.switcher.digit_enabled = true;
        app.strategy.switcher.digit_win_interval = 2;
        app.strategy.switcher.digit_loss_interval = 3;
        let ctx = StrategyContext::from_config(&app);
        let mut switcher = SmartSwitcher::new();

        switcher.on_trade_result(true, &ctx);
        assert_eq!(switcher.current_digit().value(), 5);
        switcher.on_trade_result(true, &ctx);
        assert_eq!(switcher.current_digit().value(), 6);

        for _ in 0..3 {
            switcher.on_trade_result(false, &ctx);
        }
        assert_eq!(switcher.current_digit().value(), 7);

        let config = switcher
            .modify_trade_config(base_config(), &TickHistory::new(), &ctx)
            .unwrap();
        assert_eq!(config.target_digit, Digit::new(7));
    }

    #[test]
    fn test_digit_wraps_past_nine() {
        let mut app = AppConfig::default();
        app.strategy.switcher.digit_enabled = true;
        app.trade.target_digit = Digit::NINE;
        let ctx = StrategyContext::from_config(&app);
        let mut switcher = SmartSwitcher::new();
        switcher.on_activate(&ctx);

        switcher.on_trade_result(true, &ctx);
        assert_eq!(switcher.current_digit(), Digit::ZERO);
    }

    #[test]
    fn test_market_rotation() {
        let mut app = AppConfig::default();
        app.strategy.switcher.market_enabled = true;
        app.strategy.switcher.market_loss_interval = 2;
        let ctx = StrategyContext::from_config(&app);
        let mut switcher = SmartSwitcher::new();

        let config = switcher
            .modify_trade_config(base_config(), &TickHistory::new(), &ctx)
            .unwrap();
        assert_eq!(config.market, "R_10");

        switcher.on_trade_result(false, &ctx);
        switcher.on_trade_result(false, &ctx);
        assert_eq!(switcher.current_market(), "R_25");

        for _ in 0..8 {
            switcher.on_trade_result(false, &ctx);
        }
        assert_eq!(switcher.current_market(), "R_10");
    }

    #[test]
    fn test_over_under_flips_on_trade_count() {
        let mut app = AppConfig::default();
        app.strategy.switcher.over_under_enabled = true;
        app.strategy.switcher.over_under_win_interval = 10;
        app.strategy.switcher.over_under_loss_interval = 10;
        app.strategy.switcher.over_under_trade_interval = 3;
        let ctx = StrategyContext::from_config(&app);
        let mut switcher = SmartSwitcher::new();

        let config = switcher
            .modify_trade_config(base_config(), &TickHistory::new(), &ctx)
            .unwrap();
        assert_eq!(config.contract_type, ContractType::DigitUnder);
        assert_eq!(config.target_digit, Digit::new(5));

        // alternate outcomes so neither streak fires
        switcher.on_trade_result(true, &ctx);
        switcher.on_trade_result(false, &ctx);
        assert_eq!(switcher.over_under_mode(), OverUnderMode::Under);
        switcher.on_trade_result(true, &ctx);
        assert_eq!(switcher.over_under_mode(), OverUnderMode::Over);
        assert_eq!(switcher.trades_since_flip(), 0);

        let config = switcher
            .modify_trade_config(base_config(), &TickHistory::new(), &ctx)
            .unwrap();
        assert_eq!(config.contract_type, ContractType::DigitOver);
        assert_eq!(config.target_digit, Digit::new(4));
    }

    #[test]
    fn test_over_under_streak_resets_trade_counter() {
        let mut app = AppConfig::default();
        app.strategy.switcher.over_under_enabled = true;
        app.strategy.switcher.over_under_win_interval = 2;
        app.strategy.switcher.over_under_trade_interval = 3;
        let ctx = StrategyContext::from_config(&app);
        let mut switcher = SmartSwitcher::new();

        switcher.on_trade_result(true, &ctx);
        switcher.on_trade_result(true, &ctx);
        assert_eq!(switcher.over_under_mode(), OverUnderMode::Over);
        assert_eq!(switcher.trades_since_flip(), 0);

        // one more trade must not trip the trade interval left over from before
        switcher.on_trade_result(false, &ctx);
        assert_eq!(switcher.over_under_mode(), OverUnderMode::Over);
    }

    #[test]
    fn test_over_under_overrides_digit_axis() {
        let mut app = AppConfig::default();
        app.strategy.switcher.over_under_enabled = true;
        app.strategy.switcher.digit_enabled = true;
        let ctx = StrategyContext::from_config(&app);
        let mut switcher = SmartSwitcher::new();
        switcher.on_trade_result(true, &ctx);

        let config = switcher
            .modify_trade_config(base_config(), &TickHistory::new(), &ctx)
            .unwrap();
        assert_eq!(config.target_digit, Digit::new(5));
        assert_eq!(switcher.current_digit().value(), 6);
    }

    #[test]
    fn test_reset_clears_counters_only() {
        let mut app = AppConfig::default();
        app.strategy.switcher.digit_enabled = true;
        app.strategy.switcher.digit_win_interval = 2;
        let ctx = StrategyContext::from_config(&app);
        let mut switcher = SmartSwitcher::new();

        switcher.on_trade_result(true, &ctx);
        switcher.on_trade_result(true, &ctx);
        switcher.on_trade_result(true, &ctx);
        switcher.reset();
        assert_eq!(switcher.current_digit().value(), 6);

        // the half-finished streak was forgotten
        switcher.on_trade_result(true, &ctx);
        assert_eq!(switcher.current_digit().value(), 6);
    }
}
