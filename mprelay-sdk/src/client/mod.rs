//! HTTP clients for the payment-search API and the downstream collectors.
//!
//! Gated behind the `client` cargo feature so crates that only need the wire
//! objects do not pull in `reqwest`.

mod collector;
mod payments;

pub use collector::CollectorClient;
pub use payments::{PaymentsClient, SearchPage, SearchQuery, format_begin_date};

use reqwest::StatusCode;

/// Errors produced by the HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Whether the request gave up because its timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }
}

/// Build a pooled `reqwest::Client` with a per-request timeout.
///
/// The client keeps connections alive between calls, so one instance should
/// be reused for the whole process lifetime.
pub fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, ClientError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("mprelay/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    Ok(resp)
}
