//! Martingale stake progression

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::types::MartingaleConfig;

/// Stake for the next trade and its position in the progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeState {
    pub stake: Decimal,
    pub step: u32,
}

impl StakeState {
    pub fn initial(config: &MartingaleConfig) -> Self {
        Self {
            stake: config.initial_stake,
            step: 0,
        }
    }
}

/// Doubles the stake after each loss, restarting once `max_steps` stake
/// levels have been used. A win, or a disabled policy, always restarts.
///
/// With an initial stake of 1 and three steps, consecutive losses stake
/// 1, 2, 4 and then 1 again. A doubling that overflows `Decimal` also
/// restarts the progression.
#[derive(Debug, Clone, Copy)]
pub struct StakingPolicy<'a> {
    config: &'a MartingaleConfig,
}

impl<'a> StakingPolicy<'a> {
    pub fn new(config: &'a MartingaleConfig) -> Self {
        Self { config }
    }

    pub fn next(&self, current: StakeState, won: bool) -> StakeState {
        if !self.config.enabled || won {
            return StakeState::initial(self.config);
        }
        if current.step + 1 >= self.config.max_steps {
            return StakeState::initial(self.config);
        }
        match current.stake.checked_mul(Decimal::TWO) {
            Some(stake) => StakeState {
                stake,
                step: current.step + 1,
            },
            None => {
                warn!(step = current.step, "stake overflow, restarting progression");
                StakeState::initial(self.config)
            }
        }
    }
}
