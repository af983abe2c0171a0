//! Pipeline coordinator.
//!
//! [`Pipeline::ingest`] runs one reading through every stage and always
//! produces exactly one terminal [`PanelStatus`]:
//!
//! ```text
//! Received -> Validated -> Classified           -> Finalized
//!          |            \-> ClassificationFailed -> Finalized
//!          \-> Rejected ------------------------> Finalized
//! ```
//!
//! Stage failures short-circuit to a terminal verdict; nothing is retried
//! within a request. The status is committed to the [`StatusStore`] first
//! and only then forwarded to the ledger sink, outside any store lock.

use std::sync::Arc;
use std::time::Duration;

use panelwatch_core::attribution;
use panelwatch_core::classifier::Classifier;
use panelwatch_core::model::FaultClass;
use panelwatch_core::reading::{Reading, UNKNOWN_PANEL_ID};
use panelwatch_core::status::{PanelStatus, Verdict};
use panelwatch_core::status_store::StatusStore;
use panelwatch_core::validation::{self, ValidationOutcome};
use panelwatch_events::{LedgerRecord, LedgerSink, ReceiptId};

/// How long ingest waits for a ledger receipt before answering without one.
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of one ingest call.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// The committed status.
    pub status: PanelStatus,
    pub verdict: Verdict,
    /// Validator warnings, in rule order.
    pub warnings: Vec<String>,
    /// Ledger receipt, when the sink answered in time.
    pub receipt: Option<ReceiptId>,
}

/// Sequences the ingest stages over shared classifier, store and ledger.
#[derive(Clone)]
pub struct Pipeline {
    classifier: Arc<Classifier>,
    store: Arc<StatusStore>,
    ledger: Arc<dyn LedgerSink>,
    ledger_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        classifier: Arc<Classifier>,
        store: Arc<StatusStore>,
        ledger: Arc<dyn LedgerSink>,
    ) -> Self {
        Self {
            classifier,
            store,
            ledger,
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
        }
    }

    pub fn with_ledger_timeout(mut self, timeout: Duration) -> Self {
        self.ledger_timeout = timeout;
        self
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    /// Run the decision stages for one reading without side effects.
    ///
    /// Returns the terminal verdict and any validator warnings.
    pub fn evaluate(&self, reading: &Reading) -> (Verdict, Vec<String>) {
        if reading.installed_panel_id().is_none() {
            return (Verdict::NotInstalled, Vec::new());
        }

        let (normalized, warnings) = match validation::validate(reading) {
            ValidationOutcome::Accepted {
                normalized,
                warnings,
            } => (normalized, warnings),
            ValidationOutcome::Rejected { reason, category } => {
                return (Verdict::Rejected { category, reason }, Vec::new());
            }
        };

        let result = match self.classifier.classify(&normalized) {
            Ok(result) => result,
            Err(e) => {
                return (
                    Verdict::ClassificationFailed {
                        message: e.to_string(),
                    },
                    warnings,
                );
            }
        };

        let diagnosis =
            (result.class != FaultClass::Normal).then(|| attribution::attribute(&normalized));

        (Verdict::Classified { result, diagnosis }, warnings)
    }

    /// Process one reading end to end.
    pub async fn ingest(&self, reading: Reading) -> IngestOutcome {
        let (verdict, warnings) = self.evaluate(&reading);

        let panel_id = reading
            .installed_panel_id()
            .unwrap_or(UNKNOWN_PANEL_ID)
            .to_string();
        let timestamp = reading
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        let status = verdict.to_status(panel_id, timestamp);

        match &verdict {
            Verdict::Rejected { category, reason } => {
                tracing::warn!(panel_id = %status.panel_id, ?category, reason, "Reading rejected");
            }
            Verdict::ClassificationFailed { message } => {
                tracing::warn!(panel_id = %status.panel_id, error = %message, "Classification failed");
            }
            _ => {
                tracing::debug!(
                    panel_id = %status.panel_id,
                    color = ?status.color_code,
                    prediction = status.last_prediction,
                    "Reading classified"
                );
            }
        }

        let history_len = self.store.commit(reading, status.clone()).await;
        tracing::debug!(panel_id = %status.panel_id, history_len, "Status committed");

        let receipt = self
            .forward_to_ledger(LedgerRecord::new(history_len as u64, status.clone()))
            .await;

        IngestOutcome {
            status,
            verdict,
            warnings,
            receipt,
        }
    }

    /// Hand a committed status to the ledger sink, tagged with its position
    /// in the panel's history.
    ///
    /// Waits at most `ledger_timeout`; a slower append keeps running in the
    /// background and the caller proceeds without a receipt.
    async fn forward_to_ledger(&self, record: LedgerRecord) -> Option<ReceiptId> {
        let ledger = Arc::clone(&self.ledger);
        let panel_id = record.status.panel_id.clone();
        let append = tokio::spawn(async move {
            let result = ledger.record(&record).await;
            if let Err(e) = &result {
                tracing::warn!(
                    sink = ledger.name(),
                    panel_id = %record.status.panel_id,
                    error = %e,
                    "Ledger append failed"
                );
            }
            result
        });

        match tokio::time::timeout(self.ledger_timeout, append).await {
            Ok(Ok(Ok(receipt))) => Some(receipt),
            Ok(Ok(Err(_))) => None,
            Ok(Err(e)) => {
                tracing::error!(panel_id = %panel_id, error = %e, "Ledger append task failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    panel_id = %panel_id,
                    timeout_ms = self.ledger_timeout.as_millis() as u64,
                    "Ledger append still pending, answering without receipt"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
