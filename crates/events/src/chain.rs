//! Local hash-chained ledger.
//!
//! Every appended record is linked to the previous one: its receipt is the
//! SHA-256 of the previous receipt followed by the record's canonical JSON.
//! Records carry their panel history position, so distinct ingests always
//! get distinct links; re-sending an identical record returns the first
//! receipt. When a journal path is configured each link is also written as
//! a JSON line, and the chain head is restored from that file on open.
//! Deduplication only covers records sent since the ledger was opened.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use panelwatch_core::hashing::{sha256_hex, sha256_hex_chained};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::ledger::{LedgerRecord, LedgerSink, ReceiptId, SinkError};

/// Head of an empty chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// One journal line.
#[derive(Debug, Serialize, Deserialize)]
struct JournalEntry {
    height: u64,
    prev_hash: String,
    tx_hash: String,
    record: LedgerRecord,
}

#[derive(Debug)]
struct ChainState {
    head: String,
    height: u64,
    /// Record digest to receipt, for idempotent re-sends.
    receipts: HashMap<String, ReceiptId>,
}

impl ChainState {
    fn empty() -> Self {
        Self {
            head: GENESIS_HASH.to_string(),
            height: 0,
            receipts: HashMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct HashChainLedger {
    state: Mutex<ChainState>,
    journal: Option<PathBuf>,
}

impl HashChainLedger {
    /// An in-memory chain with no journal.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(ChainState::empty()),
            journal: None,
        }
    }

    /// Open a journaled chain, restoring the head from any links already in
    /// `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let mut state = ChainState::empty();

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                for line in contents.lines().filter(|l| !l.trim().is_empty()) {
                    let entry: JournalEntry = serde_json::from_str(line)?;
                    state.head = entry.tx_hash;
                    state.height = entry.height;
                }
                tracing::info!(path = %path.display(), height = state.height, "Replayed ledger journal");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            state: Mutex::new(state),
            journal: Some(path),
        })
    }

    /// Receipt of the most recent link (the genesis hash when empty).
    pub async fn head(&self) -> String {
        self.state.lock().await.head.clone()
    }

    /// Number of links in the chain.
    pub async fn height(&self) -> u64 {
        self.state.lock().await.height
    }

    async fn append_journal(path: &Path, entry: &JournalEntry) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerSink for HashChainLedger {
    fn name(&self) -> &'static str {
        "hash_chain"
    }

    async fn record(&self, record: &LedgerRecord) -> Result<ReceiptId, SinkError> {
        let payload = serde_json::to_vec(record)?;
        let digest = sha256_hex(&payload);

        let mut state = self.state.lock().await;
        if let Some(existing) = state.receipts.get(&digest) {
            return Ok(existing.clone());
        }

        let tx_hash = sha256_hex_chained(&[state.head.as_bytes(), &payload]);
        let entry = JournalEntry {
            height: state.height + 1,
            prev_hash: state.head.clone(),
            tx_hash: tx_hash.clone(),
            record: record.clone(),
        };
        if let Some(path) = &self.journal {
            Self::append_journal(path, &entry).await?;
        }

        let receipt = ReceiptId(tx_hash);
        state.head = entry.tx_hash;
        state.height = entry.height;
        state.receipts.insert(digest, receipt.clone());
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use panelwatch_core::status::Verdict;

    use super::*;

    fn record(panel_id: &str, sequence: u64, ts: i64) -> LedgerRecord {
        LedgerRecord::new(sequence, Verdict::NotInstalled.to_status(panel_id, ts))
    }

    #[tokio::test]
    async fn links_records_to_previous_head() {
        let ledger = HashChainLedger::in_memory();
        let first = ledger.record(&record("P1", 1, 1)).await.unwrap();
        assert_eq!(ledger.head().await, first.0);

        let second = ledger.record(&record("P1", 2, 2)).await.unwrap();
        let expected = sha256_hex_chained(&[
            first.0.as_bytes(),
            &serde_json::to_vec(&record("P1", 2, 2)).unwrap(),
        ]);
        assert_eq!(second.0, expected);
        assert_eq!(ledger.height().await, 2);
    }

    #[tokio::test]
    async fn resent_record_is_idempotent() {
        let ledger = HashChainLedger::in_memory();
        let a = ledger.record(&record("P1", 1, 1)).await.unwrap();
        let b = ledger.record(&record("P1", 1, 1)).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(ledger.height().await, 1);
    }

    #[tokio::test]
    async fn identical_statuses_at_different_positions_get_separate_links() {
        let ledger = HashChainLedger::in_memory();
        let a = ledger.record(&record("P1", 1, 1)).await.unwrap();
        let b = ledger.record(&record("P1", 2, 1)).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(ledger.height().await, 2);
    }

    #[tokio::test]
    async fn journal_restores_head_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let ledger = HashChainLedger::open(&path).await.unwrap();
        ledger.record(&record("P1", 1, 1)).await.unwrap();
        let last = ledger.record(&record("P2", 1, 2)).await.unwrap();
        drop(ledger);

        let reopened = HashChainLedger::open(&path).await.unwrap();
        assert_eq!(reopened.head().await, last.0);
        assert_eq!(reopened.height().await, 2);

        let next = reopened.record(&record("P1", 1, 3)).await.unwrap();
        let expected = sha256_hex_chained(&[
            last.0.as_bytes(),
            &serde_json::to_vec(&record("P1", 1, 3)).unwrap(),
        ]);
        assert_eq!(next.0, expected);
        assert_eq!(reopened.height().await, 3);
    }
}
