//! Bounded history of recent ticks and their last digits

use std::collections::VecDeque;

use crate::common::types::{Digit, Tick};

/// Maximum number of ticks (and digits) kept
pub const TICK_HISTORY_CAPACITY: usize = 200;

/// FIFO ring buffer of the most recent ticks of the subscribed market
///
/// Digits and raw ticks are kept side by side and evicted together.
/// `total_seen` keeps counting across evictions so readers can tell which
/// digits arrived since they last looked.
#[derive(Debug, Clone, Default)]
pub struct TickHistory {
    digits: VecDeque<Digit>,
    ticks: VecDeque<Tick>,
    total_seen: u64,
}

impl TickHistory {
    pub fn new() -> Self {
        Self {
            digits: VecDeque::with_capacity(TICK_HISTORY_CAPACITY),
            ticks: VecDeque::with_capacity(TICK_HISTORY_CAPACITY),
            total_seen: 0,
        }
    }

    /// Append a tick, evicting the oldest entry once full
    pub fn push(&mut self, tick: Tick) -> Digit {
        let digit = tick.digit();
        if self.digits.len() == TICK_HISTORY_CAPACITY {
            self.digits.pop_front();
            self.ticks.pop_front();
        }
        self.digits.push_back(digit);
        self.ticks.push_back(tick);
        self.total_seen += 1;
        digit
    }

    /// Drop everything, used when a new market is subscribed
    pub fn clear(&mut self) {
        self.digits.clear();
        self.ticks.clear();
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Number of ticks ever pushed, unaffected by eviction or clearing
    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    /// Digits oldest first
    pub fn digits(&self) -> impl DoubleEndedIterator<Item = Digit> + ExactSizeIterator + '_ {
        self.digits.iter().copied()
    }

    /// The most recent `n` digits, oldest first
    pub fn last_digits(&self, n: usize) -> Vec<Digit> {
        let skip = self.digits.len().saturating_sub(n);
        self.digits.iter().skip(skip).copied().collect()
    }

    /// Digits that arrived after the reader's `seen` marker, oldest first
    ///
    /// Only digits still buffered can be returned.
    pub fn digits_since(&self, seen: u64) -> Vec<Digit> {
        let fresh = self.total_seen.saturating_sub(seen);
        let fresh = usize::try_from(fresh).unwrap_or(usize::MAX);
        self.last_digits(fresh)
    }

    pub fn last_digit(&self) -> Option<Digit> {
        self.digits.back().copied()
    }

    pub fn last_tick(&self) -> Option<&Tick> {
        self.ticks.back()
    }

    pub fn ticks(&self) -> impl Iterator<Item = &Tick> + '_ {
        self.ticks.iter()
    }
}
