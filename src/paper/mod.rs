//! Paper trading venue
//!
//! A [`Transport`](crate::common::traits::Transport) implementation that
//! simulates tick streams, quotes and settlement in process, so the engine
//! can run complete sessions without a live venue.

pub mod pricing;
pub mod venue;

pub use venue::PaperVenue;
