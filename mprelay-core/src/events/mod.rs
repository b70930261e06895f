//! Event system driving the poll loop.
//!
//! # Event Flow
//!
//! 1. `PollScheduler` emits `RelayTick` -> `RelayRunner`
//! 2. `RelayRunner` runs one relay cycle and answers the tick's
//!    completion handle with a `CycleReport`
//! 3. `PollScheduler` sleeps the poll interval, then emits the next tick
//!
//! Cycles never overlap: a tick is only emitted once the previous one has
//! been answered (or dropped).

pub mod channels;
pub mod types;

pub use channels::{DEFAULT_CHANNEL_BUFFER, RelayTickReceiver, RelayTickSender, relay_tick_channel};

pub use types::{
    AccountOutcome, AccountReport, CycleReport, DeliveryOutcome, DestinationReport, RelayTick,
};
