//! Authoritative per-panel status and history.
//!
//! Each panel has its own record behind its own mutex. The outer map lock
//! is only held long enough to look up (or insert) a panel's record, so
//! commits for different panels never wait on each other's critical
//! section. The current status and the history append for a panel are
//! updated under the same per-panel lock, so readers never observe a
//! history that disagrees with the current status.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::reading::Reading;
use crate::status::{HistoryEntry, PanelStatus};

#[derive(Debug, Default)]
struct PanelRecord {
    current: Option<PanelStatus>,
    history: Vec<HistoryEntry>,
}

/// Concurrent map from panel id to latest status and append-only history.
#[derive(Debug, Default)]
pub struct StatusStore {
    panels: RwLock<HashMap<String, Arc<Mutex<PanelRecord>>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for `panel_id`, creating it if needed.
    async fn record(&self, panel_id: &str) -> Arc<Mutex<PanelRecord>> {
        if let Some(record) = self.panels.read().await.get(panel_id) {
            return Arc::clone(record);
        }
        let mut panels = self.panels.write().await;
        Arc::clone(panels.entry(panel_id.to_string()).or_default())
    }

    async fn existing(&self, panel_id: &str) -> Option<Arc<Mutex<PanelRecord>>> {
        self.panels.read().await.get(panel_id).map(Arc::clone)
    }

    /// Overwrite the panel's current status and append a history entry in
    /// one critical section.
    ///
    /// Returns the number of history entries the panel now has.
    pub async fn commit(&self, input: Reading, status: PanelStatus) -> usize {
        let record = self.record(&status.panel_id).await;
        let mut record = record.lock().await;
        record.history.push(HistoryEntry {
            input,
            outcome: status.clone(),
        });
        record.current = Some(status);
        record.history.len()
    }

    /// Latest status for a panel, if it has ever been seen.
    pub async fn current(&self, panel_id: &str) -> Option<PanelStatus> {
        let record = self.existing(panel_id).await?;
        let record = record.lock().await;
        record.current.clone()
    }

    /// Full history for a panel in arrival order. Empty for unknown panels.
    pub async fn history(&self, panel_id: &str) -> Vec<HistoryEntry> {
        match self.existing(panel_id).await {
            Some(record) => record.lock().await.history.clone(),
            None => Vec::new(),
        }
    }

    /// Current status of every known panel, sorted by panel id.
    pub async fn snapshot(&self) -> Vec<PanelStatus> {
        let records: Vec<_> = self.panels.read().await.values().map(Arc::clone).collect();
        let mut statuses = Vec::with_capacity(records.len());
        for record in records {
            if let Some(status) = record.lock().await.current.clone() {
                statuses.push(status);
            }
        }
        statuses.sort_by(|a, b| a.panel_id.cmp(&b.panel_id));
        statuses
    }

    pub async fn panel_count(&self) -> usize {
        self.panels.read().await.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
