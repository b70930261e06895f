//! Staleness lower bound.

use crate::config::WatermarkMode;
use time::OffsetDateTime;

/// Transactions created before this instant are assumed already seen.
///
/// The value never decreases. In [`WatermarkMode::Fixed`] it never moves at
/// all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    current: OffsetDateTime,
    mode: WatermarkMode,
}

impl Watermark {
    pub fn new(start: OffsetDateTime, mode: WatermarkMode) -> Self {
        Self {
            current: start,
            mode,
        }
    }

    pub fn current(&self) -> OffsetDateTime {
        self.current
    }

    pub fn mode(&self) -> WatermarkMode {
        self.mode
    }

    /// Inclusive lower bound: a timestamp equal to the watermark is fresh.
    pub fn is_stale(&self, created_at: OffsetDateTime) -> bool {
        created_at < self.current
    }

    /// Raise the watermark to an accepted transaction's creation time.
    ///
    /// Returns `true` if the value moved.
    pub fn observe(&mut self, created_at: OffsetDateTime) -> bool {
        if self.mode == WatermarkMode::Advancing && created_at > self.current {
            self.current = created_at;
            return true;
        }
        false
    }
}
