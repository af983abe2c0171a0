//! HTTP ledger client with exponential-backoff retry.
//!
//! [`HttpLedger`] POSTs a JSON-encoded [`LedgerRecord`] to an external ledger
//! service and reads the transaction hash from the reply. Failed attempts
//! are retried up to three times with exponential backoff (1 s, 2 s, 4 s).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ledger::{LedgerRecord, LedgerSink, ReceiptId, SinkError};

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single append attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reply body expected from the ledger service.
#[derive(Debug, Deserialize)]
struct LedgerReply {
    tx_hash: Option<String>,
}

/// Appends status records to a remote ledger over HTTP.
pub struct HttpLedger {
    client: reqwest::Client,
    url: String,
    retry_delays: Vec<Duration>,
}

impl HttpLedger {
    /// Create a ledger client for `url` with a pre-configured HTTP client.
    pub fn new(url: impl Into<String>) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_delays: RETRY_DELAYS_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        })
    }

    /// Override the backoff schedule.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Execute a single POST request and extract the receipt.
    async fn try_send(&self, record: &LedgerRecord) -> Result<ReceiptId, SinkError> {
        let response = self.client.post(&self.url).json(record).send().await?;
        if !response.status().is_success() {
            return Err(SinkError::HttpStatus(response.status().as_u16()));
        }
        let reply: LedgerReply = response.json().await?;
        reply
            .tx_hash
            .filter(|h| !h.is_empty())
            .map(ReceiptId)
            .ok_or(SinkError::MissingReceipt)
    }
}

#[async_trait]
impl LedgerSink for HttpLedger {
    fn name(&self) -> &'static str {
        "http"
    }

    /// Append a record with retry.
    ///
    /// Returns the receipt from the first successful attempt, or the error
    /// of the final attempt.
    async fn record(&self, record: &LedgerRecord) -> Result<ReceiptId, SinkError> {
        let panel_id = &record.status.panel_id;

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(record).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %self.url,
                        panel_id = %panel_id,
                        error = %e,
                        "Ledger append attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        self.try_send(record).await.inspect_err(|e| {
            tracing::error!(url = %self.url, panel_id = %panel_id, error = %e, "Ledger append failed after all retries");
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
