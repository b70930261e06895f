//! Event channel factories and handles.

use super::types::RelayTick;
use tokio::sync::mpsc;

/// Buffer size for the tick channel.
///
/// The scheduler waits for each cycle to finish before emitting the next
/// tick, so at most one tick is ever in flight.
pub const DEFAULT_CHANNEL_BUFFER: usize = 1;

/// Sender handle for RelayTick events.
pub type RelayTickSender = mpsc::Sender<RelayTick>;
/// Receiver handle for RelayTick events.
pub type RelayTickReceiver = mpsc::Receiver<RelayTick>;

/// Create a new RelayTick channel.
pub fn relay_tick_channel() -> (RelayTickSender, RelayTickReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
