//! Configuration module for mprelay.
//!
//! Handles loading the optional TOML file and resolving every account's
//! credential and destination from the environment. Any problem here is
//! fatal: the relay never starts with a partial account table.

pub mod file;

use crate::config::file::FileConfig;
use mprelay_core::config::{AccountConfig, Credential, RelaySettings};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("missing credential for {account}: {var} is not set")]
    MissingCredential { account: String, var: String },

    #[error("missing destination for {account}: {var} is not set")]
    MissingDestination { account: String, var: String },

    #[error("invalid destination for {account}: {reason}")]
    InvalidDestination { account: String, reason: String },
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub accounts: Vec<AccountConfig>,
    pub settings: RelaySettings,
    pub api_base_url: Url,
    pub fetch_timeout: Duration,
    pub deliver_timeout: Duration,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// Load and resolve the configuration.
    ///
    /// A missing file is not an error: the built-in single-account defaults
    /// apply.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let file_config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = ?self.config_path,
                    "Config file not found, using default account table"
                );
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        resolve(file_config, |var| std::env::var(var).ok())
    }
}

/// Validate `file_config` and resolve its environment references via `env`.
pub fn resolve(
    file_config: FileConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LoadedConfig, ConfigError> {
    let relay = &file_config.relay;
    validate_relay(relay)?;

    if file_config.accounts.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one account must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    let mut accounts = Vec::with_capacity(file_config.accounts.len());
    for account in &file_config.accounts {
        if account.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "account name must not be empty".to_string(),
            ));
        }
        if !names.insert(account.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate account name {}",
                account.name
            )));
        }

        let credential = non_empty(env(&account.credential_env)).ok_or_else(|| {
            ConfigError::MissingCredential {
                account: account.name.clone(),
                var: account.credential_env.clone(),
            }
        })?;
        let destination = non_empty(env(&account.destination_env)).ok_or_else(|| {
            ConfigError::MissingDestination {
                account: account.name.clone(),
                var: account.destination_env.clone(),
            }
        })?;

        accounts.push(AccountConfig::new(
            account.name.as_str(),
            Credential::new(credential),
            parse_destination(&account.name, &destination)?,
        ));
    }

    Ok(LoadedConfig {
        accounts,
        settings: RelaySettings {
            poll_interval: Duration::from_secs(relay.poll_interval_secs),
            page_size: relay.page_size,
            max_seen_ids: relay.max_seen_ids,
            watermark: relay.watermark,
            seen_cache: relay.seen_cache,
            fetch_concurrency: relay.fetch_concurrency,
        },
        api_base_url: relay.api_base_url.clone(),
        fetch_timeout: Duration::from_secs(relay.fetch_timeout_secs),
        deliver_timeout: Duration::from_secs(relay.deliver_timeout_secs),
    })
}

fn validate_relay(relay: &file::RelayConfig) -> Result<(), ConfigError> {
    let checks = [
        (relay.poll_interval_secs == 0, "poll_interval_secs must be positive"),
        (relay.page_size == 0, "page_size must be positive"),
        (relay.fetch_timeout_secs == 0, "fetch_timeout_secs must be positive"),
        (relay.deliver_timeout_secs == 0, "deliver_timeout_secs must be positive"),
        (relay.max_seen_ids == 0, "max_seen_ids must be positive"),
        (relay.fetch_concurrency == 0, "fetch_concurrency must be positive"),
    ];
    match checks.iter().find(|(failed, _)| *failed) {
        Some((_, message)) => Err(ConfigError::ValidationError(message.to_string())),
        None => Ok(()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_destination(account: &str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDestination {
        account: account.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}
