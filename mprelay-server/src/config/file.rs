//! TOML file configuration structures.
//!
//! These structs directly map to the `mprelay.toml` file format. Secrets
//! never live in the file: accounts name the environment variables that
//! hold them.

use mprelay_core::config::{RelaySettings, SeenCacheStrategy, WatermarkMode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default = "default_accounts")]
    pub accounts: Vec<AccountConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            accounts: default_accounts(),
        }
    }
}

/// Relay tunables section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_deliver_timeout_secs")]
    pub deliver_timeout_secs: u64,
    #[serde(default = "default_max_seen_ids")]
    pub max_seen_ids: usize,
    #[serde(default)]
    pub watermark: WatermarkMode,
    #[serde(default)]
    pub seen_cache: SeenCacheStrategy,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: Url,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            page_size: default_page_size(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            deliver_timeout_secs: default_deliver_timeout_secs(),
            max_seen_ids: default_max_seen_ids(),
            watermark: WatermarkMode::default(),
            seen_cache: SeenCacheStrategy::default(),
            fetch_concurrency: default_fetch_concurrency(),
            api_base_url: default_api_base_url(),
        }
    }
}

/// One polled account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Unique name, sent as the `origen` of every record.
    pub name: String,
    /// Environment variable holding the bearer token.
    pub credential_env: String,
    /// Environment variable holding the collector URL.
    pub destination_env: String,
}

fn default_accounts() -> Vec<AccountConfig> {
    vec![AccountConfig {
        name: "MP_YO".to_string(),
        credential_env: "MP_ACCESS_TOKEN".to_string(),
        destination_env: "WEBAPP_URL_SHEET_1".to_string(),
    }]
}

fn default_poll_interval_secs() -> u64 {
    RelaySettings::DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_page_size() -> u32 {
    RelaySettings::DEFAULT_PAGE_SIZE
}

fn default_fetch_timeout_secs() -> u64 {
    RelaySettings::DEFAULT_FETCH_TIMEOUT.as_secs()
}

fn default_deliver_timeout_secs() -> u64 {
    RelaySettings::DEFAULT_DELIVER_TIMEOUT.as_secs()
}

fn default_max_seen_ids() -> usize {
    RelaySettings::DEFAULT_MAX_SEEN_IDS
}

fn default_fetch_concurrency() -> usize {
    1
}

fn default_api_base_url() -> Url {
    Url::parse(mprelay_sdk::client::PaymentsClient::DEFAULT_BASE_URL)
        .expect("valid default base url")
}
