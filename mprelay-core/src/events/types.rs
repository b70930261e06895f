//! Event and report types.

use crate::pipeline::RejectionCounts;
use compact_str::CompactString;
use tokio::sync::oneshot;
use url::Url;

/// Request to run one relay cycle.
#[derive(Debug)]
pub struct RelayTick {
    /// Monotonic cycle number, starting at 1.
    pub cycle: u64,
    /// Answered with the cycle's report once it is done.
    pub completed: Option<oneshot::Sender<CycleReport>>,
}

impl RelayTick {
    /// Create a tick together with the receiver for its report.
    pub fn new(cycle: u64) -> (Self, oneshot::Receiver<CycleReport>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                cycle,
                completed: Some(tx),
            },
            rx,
        )
    }
}

/// What happened to one account during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// The page was fetched and filtered.
    Polled {
        fetched: u32,
        accepted: u32,
        rejected: RejectionCounts,
    },
    /// Fetching failed; the account contributes nothing this cycle.
    FetchFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountReport {
    pub account: CompactString,
    pub outcome: AccountOutcome,
}

/// What happened to one destination's batch during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Nothing to send; no request was made.
    Skipped,
    Delivered { records: usize, status: u16 },
    /// The batch was lost. Its records stay in the seen caches and are not
    /// retried.
    Dropped { records: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationReport {
    pub destination: Url,
    pub outcome: DeliveryOutcome,
}

/// Structured result of one relay cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub accounts: Vec<AccountReport>,
    pub destinations: Vec<DestinationReport>,
    /// The cycle was abandoned by an unexpected failure.
    pub abandoned: bool,
}

impl CycleReport {
    /// An abandoned cycle with no per-stage results.
    pub fn abandoned(cycle: u64) -> Self {
        Self {
            cycle,
            abandoned: true,
            ..Self::default()
        }
    }

    pub fn accepted(&self) -> u32 {
        self.accounts
            .iter()
            .map(|a| match a.outcome {
                AccountOutcome::Polled { accepted, .. } => accepted,
                AccountOutcome::FetchFailed { .. } => 0,
            })
            .sum()
    }

    pub fn delivered(&self) -> usize {
        self.destinations
            .iter()
            .map(|d| match d.outcome {
                DeliveryOutcome::Delivered { records, .. } => records,
                _ => 0,
            })
            .sum()
    }

    pub fn dropped(&self) -> usize {
        self.destinations
            .iter()
            .map(|d| match d.outcome {
                DeliveryOutcome::Dropped { records, .. } => records,
                _ => 0,
            })
            .sum()
    }

    pub fn account(&self, name: &str) -> Option<&AccountOutcome> {
        self.accounts
            .iter()
            .find(|a| a.account == name)
            .map(|a| &a.outcome)
    }

    pub fn destination(&self, destination: &Url) -> Option<&DeliveryOutcome> {
        self.destinations
            .iter()
            .find(|d| &d.destination == destination)
            .map(|d| &d.outcome)
    }
}
