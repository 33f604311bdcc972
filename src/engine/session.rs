//! Session statistics and the trade log

use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::common::types::{StatsSnapshot, TradeRecord};
use crate::engine::staking::StakeState;

/// Trade records kept for display, newest first
pub const TRADE_LOG_CAPACITY: usize = 100;

/// Running totals for the current session
///
/// `wins + losses == total_trades` always holds; a zero profit counts as a
/// loss.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    total_pnl: Decimal,
    total_trades: u32,
    wins: u32,
    losses: u32,
    consecutive_losses: u32,
    trade_log: VecDeque<TradeRecord>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a settled profit into the totals and report whether it was a win
    pub fn record_result(&mut self, profit: Decimal) -> bool {
        let won = profit > Decimal::ZERO;
        self.total_trades += 1;
        self.total_pnl += profit;
        if won {
            self.wins += 1;
            self.consecutive_losses = 0;
        } else {
            self.losses += 1;
            self.consecutive_losses += 1;
        }
        won
    }

    /// Prepend a record, dropping the oldest past the cap
    pub fn log_trade(&mut self, record: TradeRecord) {
        self.trade_log.push_front(record);
        self.trade_log.truncate(TRADE_LOG_CAPACITY);
    }

    pub fn total_pnl(&self) -> Decimal {
        self.total_pnl
    }

    pub fn total_trades(&self) -> u32 {
        self.total_trades
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    /// Only the streak, used when trading is (re)started
    pub fn clear_streak(&mut self) {
        self.consecutive_losses = 0;
    }

    /// Win percentage rounded to one decimal place, 0 before any trade
    pub fn win_rate(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.wins) * Decimal::ONE_HUNDRED / Decimal::from(self.total_trades))
            .round_dp(1)
    }

    pub fn trade_log(&self) -> impl Iterator<Item = &TradeRecord> + '_ {
        self.trade_log.iter()
    }

    pub fn snapshot(&self, stake: StakeState) -> StatsSnapshot {
        StatsSnapshot {
            total_pnl: self.total_pnl,
            total_trades: self.total_trades,
            wins: self.wins,
            losses: self.losses,
            win_rate: self.win_rate(),
            consecutive_losses: self.consecutive_losses,
            current_stake: stake.stake,
            martingale_step: stake.step,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
