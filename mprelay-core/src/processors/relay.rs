//! The relay context and its fetch → filter → route → forward cycle.
//!
//! All mutable state (watermark, seen caches) is owned by [`Relay`]; nothing
//! is global, so every test can build an isolated instance.
//!
//! Locking: each account's seen cache has its own lock and the watermark has
//! one shared lock. An account's cache lock is held for the whole filtering
//! of its page; the watermark lock is taken per transaction, always after
//! the cache lock.

use crate::config::{AccountConfig, RelaySettings};
use crate::events::{
    AccountOutcome, AccountReport, CycleReport, DeliveryOutcome, DestinationReport,
};
use crate::pipeline::{RejectionCounts, accept, normalize, route};
use crate::processors::forwarder::{BatchCollector, DestinationBatch, Forwarder};
use crate::processors::source::TransactionSource;
use crate::state::{SeenCache, Watermark};
use futures_util::StreamExt;
use futures_util::stream;
use kanau::processor::Processor;
use mprelay_sdk::objects::NormalizedRecord;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

struct AccountSlot {
    config: AccountConfig,
    seen: Mutex<SeenCache>,
}

/// Relay context: configured accounts, their state, and the I/O seams.
pub struct Relay<S, C> {
    accounts: Vec<AccountSlot>,
    watermark: Mutex<Watermark>,
    settings: RelaySettings,
    source: S,
    forwarder: Forwarder<C>,
}

impl<S: TransactionSource, C: BatchCollector> Relay<S, C> {
    /// Create a relay whose watermark starts at `start`.
    pub fn new(
        accounts: Vec<AccountConfig>,
        settings: RelaySettings,
        start: OffsetDateTime,
        source: S,
        collector: C,
    ) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|config| AccountSlot {
                config,
                seen: Mutex::new(SeenCache::new(settings.seen_cache, settings.max_seen_ids)),
            })
            .collect();

        Self {
            accounts,
            watermark: Mutex::new(Watermark::new(start, settings.watermark)),
            settings,
            source,
            forwarder: Forwarder::new(collector),
        }
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountConfig> {
        self.accounts.iter().map(|slot| &slot.config)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn collector(&self) -> &C {
        self.forwarder.collector()
    }

    /// Current watermark value.
    pub async fn watermark(&self) -> OffsetDateTime {
        self.watermark.lock().await.current()
    }

    /// Number of ids remembered for `account`.
    pub async fn seen_count(&self, account: &str) -> Option<usize> {
        let slot = self.accounts.iter().find(|s| s.config.name == account)?;
        Some(slot.seen.lock().await.len())
    }

    /// Run one full cycle across all accounts and destinations.
    ///
    /// Never fails: per-account and per-destination failures are logged and
    /// recorded in the returned report.
    pub async fn run_cycle(&self, cycle: u64) -> CycleReport {
        let floor = *self.watermark.lock().await;
        let floor = &floor;

        debug!(cycle, watermark = %floor.current(), "Relay cycle started");

        // Polling
        // Futures are built up front so the stream holds no borrowing closure
        let polls: Vec<_> = self
            .accounts
            .iter()
            .map(|slot| self.poll_account(slot, floor))
            .collect();
        let polled: Vec<(AccountReport, Vec<NormalizedRecord>)> = stream::iter(polls)
            .buffered(self.settings.fetch_concurrency.max(1))
            .collect()
            .await;

        // Routing
        let mut accounts = Vec::with_capacity(polled.len());
        let routed = route(self.accounts.iter().zip(polled).map(|(slot, (report, records))| {
            accounts.push(report);
            (&slot.config.destination, records)
        }));

        // Forwarding
        let mut destinations = Vec::with_capacity(routed.len());
        for (destination, records) in routed {
            let count = records.len();
            let batch = DestinationBatch {
                destination: destination.clone(),
                records,
            };
            let outcome = match self.forwarder.process(batch).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        %destination,
                        records = count,
                        error = %e,
                        "Batch delivery failed, dropping batch"
                    );
                    DeliveryOutcome::Dropped {
                        records: count,
                        reason: e.to_string(),
                    }
                }
            };
            destinations.push(DestinationReport {
                destination,
                outcome,
            });
        }

        CycleReport {
            cycle,
            accounts,
            destinations,
            abandoned: false,
        }
    }

    /// Fetch and filter one account's page.
    async fn poll_account(
        &self,
        slot: &AccountSlot,
        floor: &Watermark,
    ) -> (AccountReport, Vec<NormalizedRecord>) {
        let account = &slot.config;
        let fetched = self
            .source
            .fetch(account, Some(floor.current()), self.settings.page_size)
            .await;

        let transactions = match fetched {
            Ok(transactions) => transactions,
            Err(e) => {
                warn!(account = %account.name, error = %e, "Fetch failed");
                let report = AccountReport {
                    account: account.name.clone(),
                    outcome: AccountOutcome::FetchFailed {
                        reason: e.to_string(),
                    },
                };
                return (report, Vec::new());
            }
        };

        let mut records = Vec::new();
        let mut rejected = RejectionCounts::default();
        {
            let mut seen = slot.seen.lock().await;
            for raw in &transactions {
                let mut watermark = self.watermark.lock().await;
                match accept(raw, floor, &mut seen, &mut watermark) {
                    Ok(accepted) => {
                        debug!(account = %account.name, id = %accepted.id, "Accepted transaction");
                        records.push(normalize(raw, &account.name));
                    }
                    Err(rejection) => {
                        debug!(
                            account = %account.name,
                            id = ?raw.id(),
                            %rejection,
                            "Rejected transaction"
                        );
                        rejected.record(rejection);
                    }
                }
            }
        }

        if !records.is_empty() {
            info!(
                account = %account.name,
                fetched = transactions.len(),
                accepted = records.len(),
                "New transactions accepted"
            );
        }

        let report = AccountReport {
            account: account.name.clone(),
            outcome: AccountOutcome::Polled {
                fetched: transactions.len() as u32,
                accepted: records.len() as u32,
                rejected,
            },
        };
        (report, records)
    }
}
