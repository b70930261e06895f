//! Inclusion filter.
//!
//! Checks run in a fixed order and the first failing one decides the
//! rejection:
//!
//! 1. `created_at` missing or unparseable, or no usable id
//! 2. created before the staleness floor
//! 3. id already in the account's seen cache
//! 4. payer has neither a document number nor an email
//!
//! Only a transaction passing all four mutates state: its id enters the
//! seen cache and the live watermark is raised to its creation time.

use crate::state::{SeenCache, Watermark};
use compact_str::CompactString;
use mprelay_sdk::objects::RawTransaction;
use time::OffsetDateTime;

/// Why a transaction was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    Unparseable,
    Stale,
    Duplicate,
    Anonymous,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Unparseable => write!(f, "unparseable"),
            Rejection::Stale => write!(f, "stale"),
            Rejection::Duplicate => write!(f, "duplicate"),
            Rejection::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Per-reason rejection tally for one account in one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub unparseable: u32,
    pub stale: u32,
    pub duplicate: u32,
    pub anonymous: u32,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Unparseable => self.unparseable += 1,
            Rejection::Stale => self.stale += 1,
            Rejection::Duplicate => self.duplicate += 1,
            Rejection::Anonymous => self.anonymous += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.unparseable + self.stale + self.duplicate + self.anonymous
    }
}

/// A transaction that passed the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub id: CompactString,
    pub created_at: OffsetDateTime,
}

/// Run the inclusion checks and, on acceptance, update `cache` and
/// `watermark`.
///
/// `floor` is the watermark as it stood when the cycle started. Staleness
/// is judged against it rather than against `watermark`, so a page that
/// lists the newest transaction first does not make its older siblings in
/// the same cycle stale.
pub fn accept(
    raw: &RawTransaction,
    floor: &Watermark,
    cache: &mut SeenCache,
    watermark: &mut Watermark,
) -> Result<Accepted, Rejection> {
    let Some(created_at) = raw.created_at() else {
        return Err(Rejection::Unparseable);
    };
    let Some(id) = raw.id() else {
        return Err(Rejection::Unparseable);
    };
    if floor.is_stale(created_at) {
        return Err(Rejection::Stale);
    }
    if cache.contains(&id) {
        return Err(Rejection::Duplicate);
    }
    if !raw.has_identified_payer() {
        return Err(Rejection::Anonymous);
    }

    cache.insert(id.clone());
    watermark.observe(created_at);
    Ok(Accepted { id, created_at })
}
