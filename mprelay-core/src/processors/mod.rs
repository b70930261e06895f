//! Processors driving the relay.
//!
//! - `PollScheduler`: emits `RelayTick` on the poll cadence
//! - `RelayRunner`: receives `RelayTick`, runs a relay cycle
//! - `Relay`: one fetch → filter → route → forward cycle
//! - `TransactionSource`: fetches an account's newest transactions
//! - `Forwarder`: delivers a destination batch through a `BatchCollector`

pub mod forwarder;
pub mod relay;
pub mod runner;
pub mod scheduler;
pub mod source;

pub use forwarder::{BatchCollector, DestinationBatch, ForwardError, Forwarder};
pub use relay::Relay;
pub use runner::RelayRunner;
pub use scheduler::PollScheduler;
pub use source::{SourceError, TransactionSource};

use tokio::sync::watch;

/// Resolves once shutdown is signaled or the signal sender is gone.
pub(crate) async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}
