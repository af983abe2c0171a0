//! Domain logic for the panelwatch telemetry service.
//!
//! Everything here is independent of HTTP and of the ledger sink: reading
//! validation, the swappable fault classifier, fault attribution, status
//! derivation and the per-panel status store.

pub mod attribution;
pub mod classifier;
pub mod error;
pub mod hashing;
pub mod model;
pub mod reading;
pub mod status;
pub mod status_store;
pub mod types;
pub mod validation;
