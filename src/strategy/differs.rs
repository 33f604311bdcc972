//! Differs: DIGITDIFF against the digit least likely to land next
//!
//! Digit Shield counts its pause in cycles: after a loss, exactly
//! `shield_pause_ticks` cycles are vetoed and the following cycle trades.
//! A pause of 1 therefore always skips one cycle.

use tracing::{debug, info};

use crate::common::types::{ContractType, Digit, TradeConfig};
use crate::market::TickHistory;
use crate::strategy::digit_stats;
use crate::strategy::traits::Strategy;
use crate::strategy::types::{DiffersMode, StrategyContext, StrategyKind};

/// Digits inspected by the frequency based modes
pub const DIFFERS_WINDOW: usize = 10;

/// Distinct digit count in the window that marks the market as volatile
pub const VOLATILE_DISTINCT_DIGITS: usize = 7;

#[derive(Debug, Clone, Default)]
struct Shield {
    trades: u32,
    losses: u32,
    paused: bool,
    paused_cycles: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Differs {
    /// Mode that shaped the most recent trade
    mode: Option<DiffersMode>,
    target: Option<Digit>,
    shield: Shield,
}

impl Differs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digit chosen by the most recent adjustment
    pub fn target_digit(&self) -> Option<Digit> {
        self.target
    }

    pub fn is_paused(&self) -> bool {
        self.shield.paused
    }

    pub fn shield_trades(&self) -> u32 {
        self.shield.trades
    }

    /// Pick a target from the last ten digits, `None` while fewer are buffered
    fn frequency_target(ticks: &TickHistory, sweep: bool) -> Option<Digit> {
        if ticks.len() < DIFFERS_WINDOW {
            return None;
        }
        let window = ticks.last_digits(DIFFERS_WINDOW);

        if sweep && digit_stats::distinct(&window) >= VOLATILE_DISTINCT_DIGITS {
            let target = digit_stats::latest_repeat(&window)
                .or_else(|| digit_stats::most_frequent(&window));
            debug!(target = ?target, "volatility sweep on volatile window");
            return target;
        }
        digit_stats::most_frequent(&window)
    }
}

impl Strategy for Differs {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Differs
    }

    fn modify_trade_config(
        &mut self,
        mut config: TradeConfig,
        ticks: &TickHistory,
        ctx: &StrategyContext<'_>,
    ) -> Option<TradeConfig> {
        let settings = &ctx.settings.differs;
        if self.mode != Some(settings.mode) {
            if settings.mode == DiffersMode::DigitShield {
                self.shield = Shield::default();
            }
            self.mode = Some(settings.mode);
        }

        config.contract_type = ContractType::DigitDiff;

        let target = match settings.mode {
            DiffersMode::DigitShield => {
                if self.shield.paused {
                    self.shield.paused_cycles += 1;
                    if self.shield.paused_cycles <= settings.shield_pause_ticks {
                        debug!(
                            paused = self.shield.paused_cycles,
                            of = settings.shield_pause_ticks,
                            "digit shield paused"
                        );
                        return None;
                    }
                    self.shield.paused = false;
                    self.shield.paused_cycles = 0;
                    self.shield.losses = 0;
                    info!("digit shield resumed");
                }
                Some(settings.shield_digit)
            }
            DiffersMode::Frequency => Self::frequency_target(ticks, false),
            DiffersMode::VolatilitySweep => Self::frequency_target(ticks, true),
        };

        if let Some(digit) = target {
            self.target = Some(digit);
            config.target_digit = Some(digit);
        }
        Some(config)
    }

    fn on_trade_result(&mut self, won: bool, _ctx: &StrategyContext<'_>) {
        if self.mode != Some(DiffersMode::DigitShield) {
            return;
        }
        self.shield.trades += 1;
        if won {
            self.shield.losses = 0;
        } else {
            self.shield.losses += 1;
            self.shield.paused = true;
            self.shield.paused_cycles = 0;
            info!(losses = self.shield.losses, "digit shield pausing after loss");
        }
    }

    fn on_activate(&mut self, _ctx: &StrategyContext<'_>) -> Option<ContractType> {
        Some(ContractType::DigitDiff)
    }

    fn reset(&mut self) {
        self.target = None;
        self.shield = Shield::default();
    }
}
