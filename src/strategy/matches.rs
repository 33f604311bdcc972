//! Matches: DIGITMATCH with four target selection modes
//!
//! Only one mode is live at a time. The mode is picked up from settings when
//! a trade is shaped, so the outcome of that trade is always interpreted by
//! the mode that chose its digit.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::common::types::{ContractType, Digit, TradeConfig};
use crate::market::TickHistory;
use crate::strategy::traits::Strategy;
use crate::strategy::types::{MatchesMode, StrategyContext, StrategyKind};

/// Digits cycled by the prime rotation
pub const PRIME_DIGITS: [u8; 4] = [2, 3, 5, 7];

/// Echo pattern state
///
/// The window holds the last `echo_observe_ticks` digits fed to it. `seen`
/// is the tick history position already fed, `None` until the first
/// observation after entering the mode.
#[derive(Debug, Clone, Default)]
struct Echo {
    window: VecDeque<Digit>,
    seen: Option<u64>,
    queued: Option<Digit>,
    losses: u32,
}

impl Echo {
    /// Feed every digit that arrived since the previous observation
    fn observe(&mut self, ticks: &TickHistory, capacity: usize) {
        let fresh = match self.seen {
            Some(seen) => ticks.digits_since(seen),
            None => ticks.last_digits(capacity),
        };
        self.seen = Some(ticks.total_seen());

        for digit in fresh {
            self.window.push_back(digit);
            while self.window.len() > capacity {
                self.window.pop_front();
            }
            if self.queued.is_none()
                && self.window.iter().filter(|&&d| d == digit).count() >= 2
            {
                self.queued = Some(digit);
                info!(digit = %digit, "echo pattern queued");
            }
        }
    }

    /// Forget the queued digit and the window, keep the feed position
    fn clear_pattern(&mut self) {
        self.window.clear();
        self.queued = None;
        self.losses = 0;
    }
}

#[derive(Debug, Clone)]
pub struct Matches {
    /// Mode that shaped the most recent trade
    mode: Option<MatchesMode>,
    prime_index: usize,
    prime_wins: u32,
    echo: Echo,
    strike_digit: Digit,
    strike_attempts: u32,
}

impl Matches {
    pub fn new() -> Self {
        Self {
            mode: None,
            prime_index: 0,
            prime_wins: 0,
            echo: Echo::default(),
            strike_digit: Digit::ZERO,
            strike_attempts: 0,
        }
    }

    pub fn prime_digit(&self) -> Digit {
        Digit::new(PRIME_DIGITS[self.prime_index]).unwrap_or(Digit::ZERO)
    }

    pub fn prime_wins(&self) -> u32 {
        self.prime_wins
    }

    pub fn queued_echo_digit(&self) -> Option<Digit> {
        self.echo.queued
    }

    pub fn echo_losses(&self) -> u32 {
        self.echo.losses
    }

    pub fn strike_digit(&self) -> Digit {
        self.strike_digit
    }

    pub fn strike_attempts(&self) -> u32 {
        self.strike_attempts
    }

    fn enter_mode(&mut self, mode: MatchesMode) {
        match mode {
            MatchesMode::Echo => self.echo = Echo::default(),
            MatchesMode::ThreeStrike => {
                self.strike_digit = Digit::ZERO;
                self.strike_attempts = 0;
            }
            MatchesMode::Prime | MatchesMode::DigitMatch => {}
        }
        self.mode = Some(mode);
        debug!(mode = ?mode, "matches mode engaged");
    }

    fn record_prime(&mut self, won: bool, switch_wins: u32) {
        if !won {
            self.prime_wins = 0;
            return;
        }
        self.prime_wins += 1;
        if self.prime_wins >= switch_wins {
            self.prime_wins = 0;
            self.prime_index = (self.prime_index + 1) % PRIME_DIGITS.len();
            info!(digit = %self.prime_digit(), "matches rotated prime");
        }
    }

    fn record_echo(&mut self, won: bool, max_losses: u32) {
        if won {
            info!("echo pattern paid off, observing again");
            self.echo.clear_pattern();
            return;
        }
        self.echo.losses += 1;
        if self.echo.losses >= max_losses {
            info!(losses = self.echo.losses, "echo pattern abandoned");
            self.echo.clear_pattern();
        }
    }

    fn record_strike(&mut self, won: bool, max_attempts: u32) {
        self.strike_attempts += 1;
        if won {
            self.strike_attempts = 0;
        } else if self.strike_attempts >= max_attempts {
            self.strike_digit = self.strike_digit.next();
            self.strike_attempts = 0;
            info!(digit = %self.strike_digit, "3-strike moved to next digit");
        }
    }
}

impl Default for Matches {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for Matches {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Matches
    }

    fn modify_trade_config(
        &mut self,
        mut config: TradeConfig,
        ticks: &TickHistory,
        ctx: &StrategyContext<'_>,
    ) -> Option<TradeConfig> {
        let settings = &ctx.settings.matches;
        if self.mode != Some(settings.mode) {
            self.enter_mode(settings.mode);
        }

        let target = match settings.mode {
            MatchesMode::Prime => self.prime_digit(),
            MatchesMode::DigitMatch => settings.match_digit,
            MatchesMode::Echo => {
                self.echo.observe(ticks, settings.echo_observe_ticks);
                self.echo.queued.unwrap_or_else(|| self.prime_digit())
            }
            MatchesMode::ThreeStrike => self.strike_digit,
        };

        config.contract_type = ContractType::DigitMatch;
        config.target_digit = Some(target);
        Some(config)
    }

    fn on_trade_result(&mut self, won: bool, ctx: &StrategyContext<'_>) {
        let settings = &ctx.settings.matches;
        match self.mode {
            Some(MatchesMode::Prime) => self.record_prime(won, settings.prime_switch_wins),
            Some(MatchesMode::DigitMatch) | None => {}
            Some(MatchesMode::Echo) => {
                if self.echo.queued.is_some() {
                    self.record_echo(won, settings.echo_max_losses);
                } else {
                    self.record_prime(won, settings.prime_switch_wins);
                }
            }
            Some(MatchesMode::ThreeStrike) => {
                self.record_strike(won, settings.strike_max_attempts)
            }
        }
    }

    fn on_activate(&mut self, _ctx: &StrategyContext<'_>) -> Option<ContractType> {
        Some(ContractType::DigitMatch)
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Tick;
    use crate::config::types::AppConfig;
    use rust_decimal::Decimal;
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

    fn push_digits(history: &mut TickHistory, digits: &[i64]) {
        for &d in digits {
            history.push(Tick::new("R_100", Decimal::new(1000 + d, 0)));
        }
    }

    fn app_with_mode(mode: MatchesMode) -> AppConfig {
        let mut app = AppConfig::default();
        app.strategy.matches.mode = mode;
        app
    }

    fn target(matches: &mut Matches, history: &TickHistory, ctx: &StrategyContext<'_>) -> u8 {
        let config = matches
            .modify_trade_config(base_config(), history, ctx)
            .unwrap();
        assert_eq!(config.contract_type, ContractType::DigitMatch);
        config.target_digit.map(Digit::value).unwrap()
    }

    #[test]
    fn test_prime_rotation_after_consecutive_wins() {
        let app = app_with_mode(MatchesMode::Prime);
        let ctx = StrategyContext::from_config(&app);
        let history = TickHistory::new();
        let mut matches = Matches::new();

        assert_eq!(target(&mut matches, &history, &ctx), 2);
        matches.on_trade_result(true, &ctx);
        matches.on_trade_result(false, &ctx);
        matches.on_trade_result(true, &ctx);
        assert_eq!(target(&mut matches, &history, &ctx), 2);

        matches.on_trade_result(true, &ctx);
        assert_eq!(target(&mut matches, &history, &ctx), 3);

        for _ in 0..6 {
            matches.on_trade_result(true, &ctx);
        }
        assert_eq!(target(&mut matches, &history, &ctx), 2);
    }

    #[test]
    fn test_digit_match_is_fixed() {
        let mut app = app_with_mode(MatchesMode::DigitMatch);
        app.strategy.matches.match_digit = Digit::new(8).unwrap();
        let ctx = StrategyContext::from_config(&app);
        let history = TickHistory::new();
        let mut matches = Matches::new();

        assert_eq!(target(&mut matches, &history, &ctx), 8);
        matches.on_trade_result(true, &ctx);
        matches.on_trade_result(true, &ctx);
        assert_eq!(target(&mut matches, &history, &ctx), 8);
        assert_eq!(matches.prime_digit().value(), 2);
    }

    #[test]
    fn test_echo_queues_repeated_digit() {
        let app = app_with_mode(MatchesMode::Echo);
        let ctx = StrategyContext::from_config(&app);
        let mut history = TickHistory::new();
        let mut matches = Matches::new();

        push_digits(&mut history, &[1, 2, 3]);
        assert_eq!(target(&mut matches, &history, &ctx), 2);
        assert_eq!(matches.queued_echo_digit(), None);

        push_digits(&mut history, &[1]);
        assert_eq!(target(&mut matches, &history, &ctx), 1);
        assert_eq!(matches.queued_echo_digit(), Digit::new(1));

        // the queue holds while other repeats show up
        push_digits(&mut history, &[2, 2]);
        assert_eq!(target(&mut matches, &history, &ctx), 1);
    }

    #[test]
    fn test_echo_window_slides() {
        let mut app = app_with_mode(MatchesMode::Echo);
        app.strategy.matches.echo_observe_ticks = 3;
        let ctx = StrategyContext::from_config(&app);
        let mut history = TickHistory::new();
        let mut matches = Matches::new();

        push_digits(&mut history, &[4, 5, 6, 4]);
        assert_eq!(target(&mut matches, &history, &ctx), 2);
        assert_eq!(matches.queued_echo_digit(), None);
    }

    #[test]
    fn test_echo_clears_on_win_and_after_max_losses() {
        let app = app_with_mode(MatchesMode::Echo);
        let ctx = StrategyContext::from_config(&app);
        let mut history = TickHistory::new();
        let mut matches = Matches::new();

        push_digits(&mut history, &[1, 2, 3, 1]);
        assert_eq!(target(&mut matches, &history, &ctx), 1);
        matches.on_trade_result(true, &ctx);
        assert_eq!(matches.queued_echo_digit(), None);

        // digits already observed are not replayed after a clear
        assert_eq!(target(&mut matches, &history, &ctx), 2);

        push_digits(&mut history, &[9, 9]);
        assert_eq!(target(&mut matches, &history, &ctx), 9);
        matches.on_trade_result(false, &ctx);
        matches.on_trade_result(false, &ctx);
        assert_eq!(matches.echo_losses(), 2);
        assert_eq!(matches.queued_echo_digit(), Digit::new(9));
        matches.on_trade_result(false, &ctx);
        assert_eq!(matches.queued_echo_digit(), None);
        assert_eq!(matches.echo_losses(), 0);
    }

    #[test]
    fn test_three_strike_advances_after_max_attempts() {
        let app = app_with_mode(MatchesMode::ThreeStrike);
        let ctx = StrategyContext::from_config(&app);
        let history = TickHistory::new();
        let mut matches = Matches::new();

        assert_eq!(target(&mut matches, &history, &ctx), 0);
        matches.on_trade_result(false, &ctx);
        matches.on_trade_result(false, &ctx);
        assert_eq!(matches.strike_attempts(), 2);
        matches.on_trade_result(false, &ctx);

        assert_eq!(matches.strike_digit().value(), 1);
        assert_eq!(matches.strike_attempts(), 0);
        assert_eq!(target(&mut matches, &history, &ctx), 1);

        matches.on_trade_result(false, &ctx);
        matches.on_trade_result(true, &ctx);
        assert_eq!(matches.strike_attempts(), 0);
        assert_eq!(matches.strike_digit().value(), 1);
    }

    #[test]
    fn test_switching_into_three_strike_restarts_at_zero() {
        let mut app = app_with_mode(MatchesMode::ThreeStrike);
        let history = TickHistory::new();
        let mut matches = Matches::new();
        {
            let ctx = StrategyContext::from_config(&app);
            target(&mut matches, &history, &ctx);
            for _ in 0..3 {
                matches.on_trade_result(false, &ctx);
            }
        }
        assert_eq!(matches.strike_digit().value(), 1);

        app.strategy.matches.mode = MatchesMode::Prime;
        let ctx = StrategyContext::from_config(&app);
        target(&mut matches, &history, &ctx);

        app.strategy.matches.mode = MatchesMode::ThreeStrike;
        let ctx = StrategyContext::from_config(&app);
        assert_eq!(target(&mut matches, &history, &ctx), 0);
    }

    #[test]
    fn test_result_uses_mode_that_shaped_the_trade() {
        let mut app = app_with_mode(MatchesMode::ThreeStrike);
        let history = TickHistory::new();
        let mut matches = Matches::new();
        {
            let ctx = StrategyContext::from_config(&app);
            target(&mut matches, &history, &ctx);
        }

        // settings change while the trade is open
        app.strategy.matches.mode = MatchesMode::Prime;
        let ctx = StrategyContext::from_config(&app);
        matches.on_trade_result(false, &ctx);
        assert_eq!(matches.strike_attempts(), 1);
        assert_eq!(matches.prime_wins(), 0);
    }

    #[test]
    fn test_reset_and_activation() {
        let app = app_with_mode(MatchesMode::Prime);
        let ctx = StrategyContext::from_config(&app);
        let mut matches = Matches::new();
        target(&mut matches, &TickHistory::new(), &ctx);
        matches.on_trade_result(true, &ctx);
        matches.on_trade_result(true, &ctx);
        assert_eq!(matches.prime_digit().value(), 3);

        matches.reset();
        assert_eq!(matches.prime_digit().value(), 2);
        assert_eq!(matches.on_activate(&ctx), Some(ContractType::DigitMatch));
    }
}
