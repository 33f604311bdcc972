//! Channel type definitions for inter-task communication

use tokio::sync::mpsc;

use super::types::{EngineEvent, TransportEvent};
use crate::engine::runner::EngineCommand;

/// Default channel buffer size
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;

/// Create a new transport event channel with the default buffer size
pub fn create_transport_channel() -> (mpsc::Sender<TransportEvent>, mpsc::Receiver<TransportEvent>) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}

/// Create the engine event channel drained by the presentation layer
///
/// Unbounded so the engine never waits on a slow subscriber.
pub fn create_engine_event_channel() -> (
    mpsc::UnboundedSender<EngineEvent>,
    mpsc::UnboundedReceiver<EngineEvent>,
) {
    mpsc::unbounded_channel()
}

/// Commands are rare, a small buffer is enough
pub const COMMAND_CHANNEL_SIZE: usize = 64;

/// Create the operator command channel feeding the engine runner
pub fn create_command_channel() -> (mpsc::Sender<EngineCommand>, mpsc::Receiver<EngineCommand>) {
    mpsc::channel(COMMAND_CHANNEL_SIZE)
}
