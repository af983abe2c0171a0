//! Fault classifier with a hot-swappable decision model.
//!
//! The active model lives behind an `Arc` that is replaced wholesale on
//! retrain. A classify call clones the `Arc` under a short read lock and
//! then runs without any lock held, so it sees either the old or the new
//! model and never a partially updated one. At most one retrain runs at a
//! time; a second concurrent request is refused with [`ClassifierError::Busy`].
//! A retrain runs in its own task that holds the retrain guard until the
//! model is published, so dropping the caller's future does not release it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::model::{
    self, DecisionModel, FaultClass, ModelArtifact, TrainingError, TrainingParams,
};
use crate::reading::NormalizedReading;

/// Classifier output for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub class: FaultClass,
    /// Confidence in `class`, in `[0, 1]`.
    pub score: f64,
    pub raw_prediction: i64,
    /// Version of the model that produced this result.
    pub model_version: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("model unavailable")]
    Unavailable,

    #[error("model returned unknown class {0}")]
    UnknownClass(i64),

    #[error("a retrain is already in progress")]
    Busy,

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error("failed to persist model artifact: {0}")]
    Persist(String),

    #[error("classifier internal error: {0}")]
    Internal(String),
}

/// Summary of a successful retrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetrainReport {
    pub model_version: u64,
    pub samples: usize,
}

/// A published model and its version.
#[derive(Debug)]
struct ActiveModel {
    version: u64,
    model: Arc<dyn DecisionModel>,
}

/// Stateful wrapper around the current decision model.
#[derive(Debug)]
pub struct Classifier {
    active: RwLock<Option<Arc<ActiveModel>>>,
    retrain_lock: Arc<tokio::sync::Mutex<()>>,
    next_version: AtomicU64,
    artifact_path: Option<PathBuf>,
    params: TrainingParams,
}

impl Classifier {
    /// A classifier with no model loaded and no artifact on disk.
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
            retrain_lock: Arc::new(tokio::sync::Mutex::new(())),
            next_version: AtomicU64::new(1),
            artifact_path: None,
            params: TrainingParams::default(),
        }
    }

    /// Persist retrained models to `path`.
    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }

    pub fn with_training_params(mut self, params: TrainingParams) -> Self {
        self.params = params;
        self
    }

    /// Load the model artifact at `path`, if any, and persist future
    /// retrains there.
    ///
    /// A missing or unreadable artifact is not fatal: the classifier starts
    /// without a model and reports [`ClassifierError::Unavailable`] until a
    /// retrain succeeds.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let classifier = Self::new().with_artifact_path(path.clone());

        match tokio::fs::read(&path).await {
            Ok(bytes) => match ModelArtifact::from_bytes(&bytes) {
                Ok(artifact) => {
                    let version = classifier.publish(Arc::new(artifact.model));
                    tracing::info!(
                        path = %path.display(),
                        version,
                        samples = artifact.samples,
                        trained_at = %artifact.trained_at,
                        "Loaded model artifact"
                    );
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Model artifact is corrupt, starting without a model");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "No model artifact found, starting without a model");
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read model artifact, starting without a model");
            }
        }

        classifier
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact_path.as_deref()
    }

    /// Atomically replace the active model. Returns the new model version.
    pub fn publish(&self, model: Arc<dyn DecisionModel>) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let active = Arc::new(ActiveModel { version, model });
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some(active);
        version
    }

    fn current(&self) -> Option<Arc<ActiveModel>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    pub fn model_version(&self) -> Option<u64> {
        self.current().map(|active| active.version)
    }

    /// Classify a validated reading with the current model.
    pub fn classify(
        &self,
        reading: &NormalizedReading,
    ) -> Result<ClassificationResult, ClassifierError> {
        let active = self.current().ok_or(ClassifierError::Unavailable)?;
        let prediction = active.model.predict(&reading.features());
        let class = FaultClass::from_raw(prediction.raw_class)
            .ok_or(ClassifierError::UnknownClass(prediction.raw_class))?;

        Ok(ClassificationResult {
            class,
            score: prediction.score.clamp(0.0, 1.0),
            raw_prediction: prediction.raw_class,
            model_version: active.version,
        })
    }

    /// Train a new model and publish it.
    ///
    /// The artifact (when configured) is written before the model is
    /// published; any failure leaves the previous model and artifact in
    /// effect. Training, persisting and publishing run to completion even if
    /// the returned future is dropped.
    pub async fn retrain(
        self: &Arc<Self>,
        features: Vec<Vec<f64>>,
        labels: Vec<i64>,
    ) -> Result<RetrainReport, ClassifierError> {
        let guard = Arc::clone(&self.retrain_lock)
            .try_lock_owned()
            .map_err(|_| ClassifierError::Busy)?;

        let classifier = Arc::clone(self);
        tokio::spawn(async move {
            let result = classifier.train_and_publish(features, labels).await;
            drop(guard);
            result
        })
        .await
        .map_err(|e| ClassifierError::Internal(e.to_string()))?
    }

    async fn train_and_publish(
        &self,
        features: Vec<Vec<f64>>,
        labels: Vec<i64>,
    ) -> Result<RetrainReport, ClassifierError> {
        let samples = features.len();
        let params = self.params;
        let trained = tokio::task::spawn_blocking(move || model::train(&features, &labels, params))
            .await
            .map_err(|e| ClassifierError::Internal(e.to_string()))??;

        if let Some(path) = &self.artifact_path {
            let artifact = ModelArtifact::new(trained.clone(), samples);
            let bytes = artifact
                .to_bytes()
                .map_err(|e| ClassifierError::Persist(e.to_string()))?;
            write_atomically(path, &bytes)
                .await
                .map_err(|e| ClassifierError::Persist(e.to_string()))?;
        }

        let model_version = self.publish(Arc::new(trained));
        tracing::info!(model_version, samples, "Published retrained model");

        Ok(RetrainReport {
            model_version,
            samples,
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `bytes` to a sibling temp file and rename it over `path`.
async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
