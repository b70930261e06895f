//! Collector client (relay → spreadsheet webhook).

use reqwest::{Client, StatusCode};
use url::Url;

use super::{ClientError, ensure_success};
use crate::objects::NormalizedRecord;

/// Posts record batches to collector endpoints.
///
/// One client serves every destination; destinations are passed per call.
#[derive(Debug, Clone)]
pub struct CollectorClient {
    http: Client,
}

impl CollectorClient {
    /// Create a new `CollectorClient` that enforces `timeout` on every call.
    pub fn new(timeout: std::time::Duration) -> Result<Self, ClientError> {
        Ok(Self {
            http: super::http_client(timeout)?,
        })
    }

    /// Replace the `reqwest::Client`.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST <destination>` with the batch as a JSON array.
    ///
    /// Returns the (2xx) status the collector answered with.
    pub async fn post_batch(
        &self,
        destination: &Url,
        records: &[NormalizedRecord],
    ) -> Result<StatusCode, ClientError> {
        let resp = self
            .http
            .post(destination.clone())
            .json(records)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(id: &str) -> NormalizedRecord {
        NormalizedRecord {
            id: id.into(),
            origin: "MP_YO".into(),
            amount: None,
            created_at: None,
            status: Some("approved".to_string()),
            operation_type: None,
            payer_document_number: None,
            payer_email: Some("a@b.com".to_string()),
            payer_first_name: None,
            payer_last_name: None,
            bank_transfer_id: None,
            acquirer_reference: None,
            end_to_end_id: None,
            transfer_account_id: None,
        }
    }

    #[tokio::test]
    async fn test_post_batch_sends_json_array() {
        let server = MockServer::start().await;
        let batch = vec![record("1"), record("2")];
        Mock::given(method("POST"))
            .and(path("/macros/exec"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::to_value(&batch).unwrap()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let destination: Url = format!("{}/macros/exec", server.uri()).parse().unwrap();
        let status = CollectorClient::new(Duration::from_secs(15))
            .unwrap()
            .post_batch(&destination, &batch)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_post_batch_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("script error"))
            .mount(&server)
            .await;

        let destination: Url = server.uri().parse().unwrap();
        let err = CollectorClient::new(Duration::from_secs(15))
            .unwrap()
            .post_batch(&destination, &[record("1")])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status, .. } if status.as_u16() == 500));
    }
}
