//! Payment-search API client (relay → provider).

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;
use url::Url;

use super::{ClientError, ensure_success};
use crate::objects::RawTransaction;

/// Query parameters for one search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQuery {
    /// Page size; results are always the newest first.
    pub limit: u32,
    /// Lower bound on the creation time, if any.
    pub begin_date: Option<OffsetDateTime>,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub results: Vec<RawTransaction>,
    /// Entries of `results` that were not JSON objects and were dropped.
    pub skipped: usize,
}

/// Typed HTTP client for the provider's **payment search** endpoint.
#[derive(Debug, Clone)]
pub struct PaymentsClient {
    http: Client,
    base_url: Url,
}

impl PaymentsClient {
    pub const DEFAULT_BASE_URL: &str = "https://api.mercadopago.com";
    const SEARCH_PATH: &str = "/v1/payments/search";

    /// Create a new `PaymentsClient` that enforces `timeout` on every call.
    pub fn new(base_url: Url, timeout: std::time::Duration) -> Result<Self, ClientError> {
        Ok(Self {
            http: super::http_client(timeout)?,
            base_url,
        })
    }

    /// Replace the `reqwest::Client` (e.g. to share a connection pool).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /v1/payments/search` – newest transactions first.
    pub async fn search_recent(
        &self,
        credential: &str,
        query: &SearchQuery,
    ) -> Result<SearchPage, ClientError> {
        let url = self.base_url.join(Self::SEARCH_PATH)?;

        let limit = query.limit.to_string();
        let mut params: Vec<(&str, String)> = vec![
            ("sort", "date_created".to_owned()),
            ("criteria", "desc".to_owned()),
            ("limit", limit),
        ];
        if let Some(begin) = query.begin_date {
            params.push(("begin_date", format_begin_date(begin)));
        }

        let resp = self
            .http
            .get(url)
            .bearer_auth(credential)
            .query(&params)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let bytes = resp.bytes().await?;
        parse_search_page(&bytes)
    }
}

/// Format a lower bound the way the search endpoint expects it:
/// UTC, whole seconds, with a literal `.000Z` suffix.
pub fn format_begin_date(at: OffsetDateTime) -> String {
    let utc = at.to_offset(time::UtcOffset::UTC);
    let utc = utc.replace_nanosecond(0).unwrap_or(utc);
    utc.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].000Z"
    ))
    .unwrap_or_default()
}

fn parse_search_page(bytes: &[u8]) -> Result<SearchPage, ClientError> {
    #[derive(Deserialize)]
    struct SearchResponse {
        #[serde(default)]
        results: Vec<Value>,
    }

    let response: SearchResponse = serde_json::from_slice(bytes)?;
    let mut page = SearchPage::default();
    for value in response.results {
        match RawTransaction::from_value(value) {
            Some(tx) => page.results.push(tx),
            None => page.skipped += 1,
        }
    }
    Ok(page)
}
