//! Batch forwarder.
//!
//! Delivers one destination's batch per cycle with a single POST. A failed
//! delivery is never retried: the records stay marked as seen, so the batch
//! is dropped rather than re-sent (at-most-once).

use crate::events::DeliveryOutcome;
use async_trait::async_trait;
use kanau::processor::Processor;
use mprelay_sdk::client::{ClientError, CollectorClient};
use mprelay_sdk::objects::NormalizedRecord;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Errors that can occur during batch delivery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForwardError {
    /// The per-call timeout elapsed
    #[error("delivery timed out")]
    Timeout,

    /// Connection, TLS or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The collector answered with a non-2xx status
    #[error("collector returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<ClientError> for ForwardError {
    fn from(e: ClientError) -> Self {
        match e {
            e if e.is_timeout() => ForwardError::Timeout,
            ClientError::Api { status, body } => ForwardError::Rejected {
                status: status.as_u16(),
                body,
            },
            other => ForwardError::Transport(other.to_string()),
        }
    }
}

/// Trait for collector endpoints.
#[async_trait]
pub trait BatchCollector: Send + Sync {
    /// POST `records` to `destination`, returning the 2xx status on success.
    async fn deliver(
        &self,
        destination: &Url,
        records: &[NormalizedRecord],
    ) -> Result<u16, ForwardError>;
}

#[async_trait]
impl BatchCollector for CollectorClient {
    async fn deliver(
        &self,
        destination: &Url,
        records: &[NormalizedRecord],
    ) -> Result<u16, ForwardError> {
        let status = self.post_batch(destination, records).await?;
        Ok(status.as_u16())
    }
}

/// One destination's records for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationBatch {
    pub destination: Url,
    pub records: Vec<NormalizedRecord>,
}

/// Forwards destination batches through a [`BatchCollector`].
pub struct Forwarder<C> {
    collector: C,
}

impl<C: BatchCollector> Forwarder<C> {
    pub fn new(collector: C) -> Self {
        Self { collector }
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }
}

impl<C: BatchCollector> Processor<DestinationBatch> for Forwarder<C> {
    type Output = DeliveryOutcome;
    type Error = ForwardError;

    async fn process(&self, batch: DestinationBatch) -> Result<DeliveryOutcome, ForwardError> {
        if batch.records.is_empty() {
            debug!(destination = %batch.destination, "Nothing to forward");
            return Ok(DeliveryOutcome::Skipped);
        }

        let records = batch.records.len();
        let status = self
            .collector
            .deliver(&batch.destination, &batch.records)
            .await?;

        info!(
            destination = %batch.destination,
            records,
            status,
            "Batch delivered"
        );

        Ok(DeliveryOutcome::Delivered { records, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize;
    use mprelay_sdk::objects::RawTransaction;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingCollector {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BatchCollector for CountingCollector {
        async fn deliver(
            &self,
            _destination: &Url,
            _records: &[NormalizedRecord],
        ) -> Result<u16, ForwardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(200)
        }
    }

    fn record(id: u64) -> NormalizedRecord {
        normalize(
            &RawTransaction::from_value(json!({ "id": id })).unwrap(),
            "MP_YO",
        )
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_call() {
        let forwarder = Forwarder::new(CountingCollector {
            calls: AtomicUsize::new(0),
        });
        let outcome = forwarder
            .process(DestinationBatch {
                destination: "https://sheets.example/one".parse().unwrap(),
                records: vec![],
            })
            .await
            .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Skipped);
        assert_eq!(forwarder.collector().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delivered_batch() {
        let forwarder = Forwarder::new(CountingCollector {
            calls: AtomicUsize::new(0),
        });
        let outcome = forwarder
            .process(DestinationBatch {
                destination: "https://sheets.example/one".parse().unwrap(),
                records: vec![record(1), record(2)],
            })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DeliveryOutcome::Delivered {
                records: 2,
                status: 200
            }
        );
        assert_eq!(forwarder.collector().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_collector_rejection_through_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(302).set_body_string("moved"))
            .expect(1)
            .mount(&server)
            .await;

        let client = CollectorClient::new(Duration::from_secs(15))
            .unwrap()
            .with_http_client(
                reqwest::Client::builder()
                    .redirect(reqwest::redirect::Policy::none())
                    .build()
                    .unwrap(),
            );
        let forwarder = Forwarder::new(client);
        let err = forwarder
            .process(DestinationBatch {
                destination: server.uri().parse().unwrap(),
                records: vec![record(1)],
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ForwardError::Rejected {
                status: 302,
                body: "moved".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_collector_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let forwarder = Forwarder::new(CollectorClient::new(Duration::from_millis(50)).unwrap());
        let err = forwarder
            .process(DestinationBatch {
                destination: server.uri().parse().unwrap(),
                records: vec![record(1)],
            })
            .await
            .unwrap_err();
        assert_eq!(err, ForwardError::Timeout);
    }
}
