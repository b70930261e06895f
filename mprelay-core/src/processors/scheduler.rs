//! PollScheduler processor.
//!
//! The PollScheduler is responsible for:
//! - Emitting a `RelayTick` right away, then once per poll interval
//! - Waiting for each tick's cycle to complete before sleeping, so a slow
//!   cycle delays the next one instead of overlapping it
//! - Stopping between cycles when shutdown is signaled

use crate::events::{RelayTick, RelayTickSender};
use crate::processors::shutdown_requested;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Drives the relay at a fixed cadence.
pub struct PollScheduler {
    interval: Duration,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run the PollScheduler until shutdown is signaled or the runner goes
    /// away.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>, tick_tx: RelayTickSender) {
        info!(interval_secs = self.interval.as_secs(), "PollScheduler started");

        let mut cycle = 0u64;
        loop {
            cycle += 1;
            let (tick, completed) = RelayTick::new(cycle);

            // Polling: hand the tick to the runner.
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut shutdown_rx) => {
                    info!("PollScheduler received shutdown signal");
                    break;
                }

                sent = tick_tx.send(tick) => {
                    if sent.is_err() {
                        warn!(cycle, "Failed to send RelayTick, receiver dropped");
                        break;
                    }
                    debug!(cycle, "Emitted RelayTick");
                }
            }

            // Wait until the cycle has been forwarded.
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut shutdown_rx) => {
                    info!("PollScheduler received shutdown signal");
                    break;
                }

                report = completed => {
                    if report.is_err() {
                        debug!(cycle, "RelayTick dropped without a report");
                    }
                }
            }

            // Sleeping
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut shutdown_rx) => {
                    info!("PollScheduler received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("PollScheduler shutdown complete");
    }
}
