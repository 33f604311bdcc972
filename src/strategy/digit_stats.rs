//! Frequency statistics over short digit windows

use crate::common::types::Digit;

/// Occurrences of each digit value
pub fn counts(window: &[Digit]) -> [usize; 10] {
    let mut counts = [0usize; 10];
    for digit in window {
        counts[usize::from(digit.value())] += 1;
    }
    counts
}

/// Number of different digit values in the window
pub fn distinct(window: &[Digit]) -> usize {
    counts(window).iter().filter(|&&c| c > 0).count()
}

/// Most frequent digit; on equal counts the one seen first in the window wins
pub fn most_frequent(window: &[Digit]) -> Option<Digit> {
    let counts = counts(window);
    let max = counts.iter().copied().max().filter(|&m| m > 0)?;
    window
        .iter()
        .copied()
        .find(|d| counts[usize::from(d.value())] == max)
}

/// Digit occurring at least twice whose last occurrence is the most recent
pub fn latest_repeat(window: &[Digit]) -> Option<Digit> {
    let counts = counts(window);
    window
        .iter()
        .rev()
        .copied()
        .find(|d| counts[usize::from(d.value())] >= 2)
}
