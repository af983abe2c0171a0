//! Ledger sinks for finalized panel status records.
//!
//! The pipeline hands every committed [`PanelStatus`](panelwatch_core::status::PanelStatus),
//! wrapped in a [`LedgerRecord`] with its history position, to a
//! [`LedgerSink`] after the in-memory store is updated. Sinks are best
//! effort: their failures are reported to the caller and logged, never
//! rolled back into the store.

pub mod chain;
pub mod http;
pub mod ledger;

pub use chain::HashChainLedger;
pub use http::HttpLedger;
pub use ledger::{LedgerRecord, LedgerSink, ReceiptId, SinkError};
