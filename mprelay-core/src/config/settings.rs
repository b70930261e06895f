//! Relay tunables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the staleness lower bound moves over the process lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkMode {
    /// Start at process start and rise to the newest accepted creation time.
    #[default]
    Advancing,
    /// Stay at process start forever.
    Fixed,
}

/// Eviction policy of a full seen-id cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeenCacheStrategy {
    /// Evict the oldest id once capacity is exceeded.
    #[default]
    Fifo,
    /// Forget every id once capacity is exceeded, keeping only the newest.
    ///
    /// Known issue: ids forgotten this way can be forwarded again if the
    /// provider still returns them.
    ClearOnOverflow,
}

/// Tunables for the poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Delay between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
    /// Search page size per account per cycle.
    pub page_size: u32,
    /// Seen-id capacity per account.
    pub max_seen_ids: usize,
    pub watermark: WatermarkMode,
    pub seen_cache: SeenCacheStrategy,
    /// Accounts fetched at once. `1` polls them one after another.
    pub fetch_concurrency: usize,
}

impl RelaySettings {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(40);
    pub const DEFAULT_PAGE_SIZE: u32 = 5;
    pub const DEFAULT_MAX_SEEN_IDS: usize = 5000;
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_DELIVER_TIMEOUT: Duration = Duration::from_secs(15);
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            page_size: Self::DEFAULT_PAGE_SIZE,
            max_seen_ids: Self::DEFAULT_MAX_SEEN_IDS,
            watermark: WatermarkMode::default(),
            seen_cache: SeenCacheStrategy::default(),
            fetch_concurrency: 1,
        }
    }
}
