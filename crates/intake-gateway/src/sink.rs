//! Network seam for writing a record.

use async_trait::async_trait;
use intake_core::config::GatewayConfig;
use intake_core::Record;

use crate::error::GatewayError;

const USER_AGENT: &str = concat!("intake/", env!("CARGO_PKG_VERSION"));

/// HTTP status returned by the persistence service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkResponse {
    pub status: u16,
}

impl SinkResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Destination for finished records. One call is one write attempt.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Send the full record. `Err` only when no response was received.
    async fn post_record(&self, record: &Record) -> Result<SinkResponse, GatewayError>;
}

/// POSTs the record as JSON to the configured endpoint.
pub struct HttpRecordSink {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpRecordSink {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RecordSink for HttpRecordSink {
    async fn post_record(&self, record: &Record) -> Result<SinkResponse, GatewayError> {
        tracing::debug!(endpoint = %self.endpoint, "Posting intake record");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        tracing::info!(status = status.as_u16(), "Persistence service responded");

        if !status.is_success() {
            // Drain the body so the connection can be reused.
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body_len = body.len(),
                "Record rejected by persistence service"
            );
        }

        Ok(SinkResponse {
            status: status.as_u16(),
        })
    }
}
