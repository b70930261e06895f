//! Source client: fetch one account's newest transactions.

use crate::config::AccountConfig;
use async_trait::async_trait;
use mprelay_sdk::client::{ClientError, PaymentsClient, SearchQuery};
use mprelay_sdk::objects::RawTransaction;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Errors that can occur while fetching an account's transactions.
///
/// All of them are soft: the account simply contributes nothing this cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The per-call timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a search result
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<ClientError> for SourceError {
    fn from(e: ClientError) -> Self {
        match e {
            e if e.is_timeout() => SourceError::Timeout,
            ClientError::Api { status, body } => SourceError::Status {
                status: status.as_u16(),
                body,
            },
            ClientError::Json(e) => SourceError::Malformed(e.to_string()),
            ClientError::Http(e) if e.is_decode() => SourceError::Malformed(e.to_string()),
            other => SourceError::Transport(other.to_string()),
        }
    }
}

/// Trait for transaction sources.
///
/// Implemented by the provider HTTP client; tests substitute scripted
/// sources.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch up to `limit` of the account's newest transactions, optionally
    /// created at or after `since`.
    async fn fetch(
        &self,
        account: &AccountConfig,
        since: Option<OffsetDateTime>,
        limit: u32,
    ) -> Result<Vec<RawTransaction>, SourceError>;
}

#[async_trait]
impl TransactionSource for PaymentsClient {
    async fn fetch(
        &self,
        account: &AccountConfig,
        since: Option<OffsetDateTime>,
        limit: u32,
    ) -> Result<Vec<RawTransaction>, SourceError> {
        let query = SearchQuery {
            limit,
            begin_date: since,
        };

        debug!(account = %account.name, ?since, limit, "Fetching transactions");

        let page = self
            .search_recent(account.credential.expose(), &query)
            .await?;

        if page.skipped > 0 {
            warn!(
                account = %account.name,
                skipped = page.skipped,
                "Skipped malformed entries in search results"
            );
        }

        Ok(page.results)
    }
}
