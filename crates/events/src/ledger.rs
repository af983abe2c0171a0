//! The ledger sink contract.

use async_trait::async_trait;
use panelwatch_core::status::PanelStatus;
use serde::{Deserialize, Serialize};

/// Receipt returned by a ledger for an appended record (a transaction hash
/// for chain-backed ledgers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(pub String);

impl std::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One committed ingest outcome as handed to a ledger.
///
/// `sequence` is the outcome's 1-based position in its panel's history, so
/// two ingests with identical statuses are still distinct records. Only a
/// re-send of the same record is deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub sequence: u64,
    #[serde(flatten)]
    pub status: PanelStatus,
}

impl LedgerRecord {
    pub fn new(sequence: u64, status: PanelStatus) -> Self {
        Self { sequence, status }
    }
}

/// Error type for ledger append failures.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote ledger returned a non-2xx status code.
    #[error("Ledger returned HTTP {0}")]
    HttpStatus(u16),

    /// The remote ledger replied without a usable receipt.
    #[error("Ledger reply carried no receipt")]
    MissingReceipt,

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Ledger journal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Idempotent append-only sink for finalized status records.
#[async_trait]
pub trait LedgerSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Append one record and return its receipt.
    async fn record(&self, record: &LedgerRecord) -> Result<ReceiptId, SinkError>;
}
