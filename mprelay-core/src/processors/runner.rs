//! Runner for the relay.
//!
//! Receives `RelayTick` events, runs one cycle per tick and answers the
//! tick with the cycle's report. A panic inside a cycle is caught and
//! logged; the runner keeps serving ticks.

use crate::events::{CycleReport, RelayTickReceiver};
use crate::processors::forwarder::BatchCollector;
use crate::processors::relay::Relay;
use crate::processors::shutdown_requested;
use crate::processors::source::TransactionSource;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

pub struct RelayRunner<S, C> {
    relay: Arc<Relay<S, C>>,
    tick_rx: RelayTickReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S, C> RelayRunner<S, C>
where
    S: TransactionSource + 'static,
    C: BatchCollector + 'static,
{
    pub fn new(
        relay: Arc<Relay<S, C>>,
        tick_rx: RelayTickReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            relay,
            tick_rx,
            shutdown_rx,
        }
    }

    /// Run the RelayRunner.
    ///
    /// Shutdown is only observed between cycles; a cycle in progress always
    /// runs to completion.
    pub async fn run(mut self) {
        info!("RelayRunner started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut self.shutdown_rx) => {
                    info!("RelayRunner received shutdown signal");
                    break;
                }

                tick = self.tick_rx.recv() => match tick {
                    Some(tick) => {
                        let report = self.run_guarded(tick.cycle).await;
                        if let Some(completed) = tick.completed {
                            let _ = completed.send(report);
                        }
                    }
                    None => {
                        info!("RelayTick channel closed");
                        break;
                    }
                },
            }
        }

        info!("RelayRunner shutdown complete");
    }

    async fn run_guarded(&self, cycle: u64) -> CycleReport {
        let result = AssertUnwindSafe(self.relay.run_cycle(cycle))
            .catch_unwind()
            .await;

        match result {
            Ok(report) => {
                let failed_accounts = report
                    .accounts
                    .iter()
                    .filter(|a| matches!(a.outcome, crate::events::AccountOutcome::FetchFailed { .. }))
                    .count();
                info!(
                    cycle,
                    accepted = report.accepted(),
                    delivered = report.delivered(),
                    dropped = report.dropped(),
                    failed_accounts,
                    "Relay cycle completed"
                );
                report
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(cycle, error = %message, "Relay cycle abandoned");
                CycleReport::abandoned(cycle)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccountConfig, Credential, RelaySettings};
    use crate::events::{RelayTick, relay_tick_channel};
    use crate::processors::forwarder::ForwardError;
    use crate::processors::source::SourceError;
    use async_trait::async_trait;
    use mprelay_sdk::objects::{NormalizedRecord, RawTransaction};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use time::OffsetDateTime;
    use time::macros::datetime;
    use url::Url;

    /// Panics on its first call, then serves one transaction.
    struct FlakySource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl TransactionSource for FlakySource {
        async fn fetch(
            &self,
            _account: &AccountConfig,
            _since: Option<OffsetDateTime>,
            _limit: u32,
        ) -> Result<Vec<RawTransaction>, SourceError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("provider client bug");
            }
            Ok(vec![
                RawTransaction::from_value(json!({
                    "id": 1,
                    "date_created": "2024-05-01T12:00:01.000Z",
                    "payer": { "email": "a@b.com" }
                }))
                .unwrap(),
            ])
        }
    }

    struct NullCollector;

    #[async_trait]
    impl BatchCollector for NullCollector {
        async fn deliver(
            &self,
            _destination: &Url,
            _records: &[NormalizedRecord],
        ) -> Result<u16, ForwardError> {
            Ok(200)
        }
    }

    fn relay() -> Arc<Relay<FlakySource, NullCollector>> {
        Arc::new(Relay::new(
            vec![AccountConfig::new(
                "X",
                Credential::new("T"),
                "https://sheets.example/d".parse().unwrap(),
            )],
            RelaySettings::default(),
            datetime!(2024-05-01 12:00:00 UTC),
            FlakySource {
                calls: AtomicU32::new(0),
            },
            NullCollector,
        ))
    }

    #[tokio::test]
    async fn test_panicking_cycle_does_not_stop_the_runner() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (tick_tx, tick_rx) = relay_tick_channel();
        let handle = tokio::spawn(RelayRunner::new(relay(), tick_rx, shutdown_rx).run());

        let (tick, report) = RelayTick::new(1);
        tick_tx.send(tick).await.unwrap();
        let report = report.await.unwrap();
        assert!(report.abandoned);

        let (tick, report) = RelayTick::new(2);
        tick_tx.send(tick).await.unwrap();
        let report = report.await.unwrap();
        assert!(!report.abandoned);
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.delivered(), 1);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_stops_when_ticks_end() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (tick_tx, tick_rx) = relay_tick_channel();
        let handle = tokio::spawn(RelayRunner::new(relay(), tick_rx, shutdown_rx).run());

        let (tick, report) = RelayTick::new(1);
        tick_tx.send(tick).await.unwrap();
        report.await.unwrap();

        // The shutdown sender is still alive; a closed tick channel alone
        // must end the runner.
        drop(tick_tx);
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("runner did not stop after its tick channel closed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_spawned_runner_polls_accounts_concurrently() {
        let settings = RelaySettings {
            fetch_concurrency: 2,
            ..RelaySettings::default()
        };
        let accounts = ["A", "B", "C"]
            .into_iter()
            .map(|name| {
                AccountConfig::new(
                    name,
                    Credential::new("T"),
                    "https://sheets.example/d".parse().unwrap(),
                )
            })
            .collect();
        let relay = Arc::new(Relay::new(
            accounts,
            settings,
            datetime!(2024-05-01 12:00:00 UTC),
            FlakySource {
                calls: AtomicU32::new(1),
            },
            NullCollector,
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (tick_tx, tick_rx) = relay_tick_channel();
        let handle = tokio::spawn(RelayRunner::new(relay, tick_rx, shutdown_rx).run());

        let (tick, report) = RelayTick::new(1);
        tick_tx.send(tick).await.unwrap();
        let report = report.await.unwrap();
        assert!(!report.abandoned);
        assert_eq!(report.accounts.len(), 3);
        assert_eq!(report.accounts[0].account, "A");
        assert_eq!(report.accounts[2].account, "C");
        // Same id from every account, but seen caches are per account.
        assert_eq!(report.accepted(), 3);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
