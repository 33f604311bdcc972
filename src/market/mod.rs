//! Market data buffered for strategies

pub mod tick_history;

pub use tick_history::{TickHistory, TICK_HISTORY_CAPACITY};
