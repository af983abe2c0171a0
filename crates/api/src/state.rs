use std::sync::Arc;
use std::time::Duration;

use panelwatch_core::classifier::Classifier;
use panelwatch_core::status_store::StatusStore;
use panelwatch_events::{HashChainLedger, HttpLedger, LedgerSink, SinkError};
use panelwatch_pipeline::Pipeline;

use crate::config::{LedgerConfig, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Ingest pipeline; owns the classifier, status store and ledger sink.
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: ServerConfig, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
        }
    }

    /// Build the full production state: load the model artifact, open the
    /// ledger sink and wire the pipeline.
    pub async fn from_config(config: ServerConfig) -> Result<Self, SinkError> {
        let classifier = Arc::new(Classifier::load(&config.model_path).await);
        let ledger = build_ledger(&config.ledger).await?;
        let pipeline = Pipeline::new(classifier, Arc::new(StatusStore::new()), ledger)
            .with_ledger_timeout(Duration::from_millis(config.ledger.timeout_ms));
        Ok(Self::new(config, pipeline))
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        self.pipeline.classifier()
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        self.pipeline.store()
    }
}

/// Pick the ledger sink named by configuration.
pub async fn build_ledger(config: &LedgerConfig) -> Result<Arc<dyn LedgerSink>, SinkError> {
    if let Some(url) = &config.url {
        tracing::info!(url = %url, "Using HTTP ledger sink");
        return Ok(Arc::new(HttpLedger::new(url.clone())?));
    }
    match &config.journal_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using journaled hash-chain ledger");
            Ok(Arc::new(HashChainLedger::open(path.clone()).await?))
        }
        None => {
            tracing::info!("Using in-memory hash-chain ledger");
            Ok(Arc::new(HashChainLedger::in_memory()))
        }
    }
}
