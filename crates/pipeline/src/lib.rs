//! Ingest pipeline: validate → classify → attribute → commit → ledger.

pub mod coordinator;

pub use coordinator::{IngestOutcome, Pipeline, DEFAULT_LEDGER_TIMEOUT};
