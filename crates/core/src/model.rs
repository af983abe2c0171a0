//! Decision models and training.
//!
//! The classifier only depends on the [`DecisionModel`] trait. The concrete
//! model shipped with the service is a standardized logistic regression
//! ([`LogisticModel`]) trained by deterministic full-batch gradient descent
//! and persisted as a JSON [`ModelArtifact`].

use serde::{Deserialize, Serialize};

use crate::types::{FeatureVector, Timestamp, FEATURE_COUNT};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Raw model output for a healthy reading.
pub const CLASS_NORMAL: i64 = 0;
/// Raw model output for a confirmed fault.
pub const CLASS_FAULT: i64 = 1;
/// Raw model output for a reading that is drifting toward a fault.
pub const CLASS_WARNING: i64 = 2;

/// Fault probability at or above which a reading is classed as a fault.
pub const FAULT_PROBABILITY: f64 = 0.5;

/// Default fault probability at or above which a reading is a warning.
pub const DEFAULT_WARNING_THRESHOLD: f64 = 0.35;

/// Artifact layout version written by this build.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const MIN_SCALE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Model contract
// ---------------------------------------------------------------------------

/// Discrete classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultClass {
    Normal,
    Warning,
    Fault,
}

impl FaultClass {
    /// Map a raw model output to a class. Unknown codes map to `None`.
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            CLASS_NORMAL => Some(FaultClass::Normal),
            CLASS_FAULT => Some(FaultClass::Fault),
            CLASS_WARNING => Some(FaultClass::Warning),
            _ => None,
        }
    }
}

/// One model decision: the raw class code and the model's confidence in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub raw_class: i64,
    /// Confidence in `raw_class`, in `[0, 1]`.
    pub score: f64,
}

/// A trained decision function over the fixed five-channel feature vector.
///
/// Implementations must be immutable once published; retraining produces a
/// new model rather than mutating an existing one.
pub trait DecisionModel: Send + Sync + std::fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> Prediction;
}

// ---------------------------------------------------------------------------
// Logistic regression
// ---------------------------------------------------------------------------

/// Logistic regression over standardized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: FeatureVector,
    pub bias: f64,
    /// Per-feature mean used for standardization.
    pub means: FeatureVector,
    /// Per-feature scale used for standardization.
    pub scales: FeatureVector,
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,
}

fn default_warning_threshold() -> f64 {
    DEFAULT_WARNING_THRESHOLD
}

impl LogisticModel {
    /// Probability that the reading is a fault.
    pub fn fault_probability(&self, features: &FeatureVector) -> f64 {
        let mut z = self.bias;
        for i in 0..FEATURE_COUNT {
            z += self.weights[i] * (features[i] - self.means[i]) / self.scales[i];
        }
        sigmoid(z)
    }
}

impl DecisionModel for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> Prediction {
        let p = self.fault_probability(features);
        if p >= FAULT_PROBABILITY {
            Prediction {
                raw_class: CLASS_FAULT,
                score: p,
            }
        } else if p >= self.warning_threshold {
            Prediction {
                raw_class: CLASS_WARNING,
                score: p,
            }
        } else {
            Prediction {
                raw_class: CLASS_NORMAL,
                score: 1.0 - p,
            }
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// Why a training run was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainingError {
    #[error("features and labels must be non-empty")]
    Empty,

    #[error("got {features} feature rows but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("feature row {row} has {width} values, expected {FEATURE_COUNT}")]
    RowWidth { row: usize, width: usize },

    #[error("feature row {row} contains a non-finite value")]
    NonFinite { row: usize },

    #[error("label at index {index} is {label}, expected 0 or 1")]
    InvalidLabel { index: usize, label: i64 },

    #[error("labels must contain both classes 0 and 1")]
    SingleClass,
}

/// Gradient descent settings.
#[derive(Debug, Clone, Copy)]
pub struct TrainingParams {
    pub iterations: usize,
    pub learning_rate: f64,
    /// L2 penalty on the weights (not the bias).
    pub l2: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            iterations: 1000,
            learning_rate: 0.5,
            l2: 1e-3,
        }
    }
}

/// Check a training set and convert it to fixed-width rows.
fn prepare(
    features: &[Vec<f64>],
    labels: &[i64],
) -> Result<(Vec<FeatureVector>, Vec<f64>), TrainingError> {
    if features.is_empty() || labels.is_empty() {
        return Err(TrainingError::Empty);
    }
    if features.len() != labels.len() {
        return Err(TrainingError::LengthMismatch {
            features: features.len(),
            labels: labels.len(),
        });
    }

    let mut rows = Vec::with_capacity(features.len());
    for (row, values) in features.iter().enumerate() {
        let fixed: FeatureVector = values
            .as_slice()
            .try_into()
            .map_err(|_| TrainingError::RowWidth {
                row,
                width: values.len(),
            })?;
        if fixed.iter().any(|v| !v.is_finite()) {
            return Err(TrainingError::NonFinite { row });
        }
        rows.push(fixed);
    }

    let mut targets = Vec::with_capacity(labels.len());
    for (index, &label) in labels.iter().enumerate() {
        match label {
            0 => targets.push(0.0),
            1 => targets.push(1.0),
            _ => return Err(TrainingError::InvalidLabel { index, label }),
        }
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    if positives == 0 || positives == labels.len() {
        return Err(TrainingError::SingleClass);
    }

    Ok((rows, targets))
}

/// Train a logistic model on `features` (rows of five values) and binary
/// `labels` (1 = fault).
///
/// Deterministic: the same inputs always produce the same model.
pub fn train(
    features: &[Vec<f64>],
    labels: &[i64],
    params: TrainingParams,
) -> Result<LogisticModel, TrainingError> {
    let (rows, targets) = prepare(features, labels)?;
    let n = rows.len() as f64;

    let mut means = [0.0; FEATURE_COUNT];
    for row in &rows {
        for i in 0..FEATURE_COUNT {
            means[i] += row[i] / n;
        }
    }
    let mut scales = [0.0; FEATURE_COUNT];
    for row in &rows {
        for i in 0..FEATURE_COUNT {
            scales[i] += (row[i] - means[i]).powi(2) / n;
        }
    }
    for scale in &mut scales {
        *scale = scale.sqrt();
        if *scale < MIN_SCALE {
            *scale = 1.0;
        }
    }

    let standardized: Vec<FeatureVector> = rows
        .iter()
        .map(|row| {
            let mut x = [0.0; FEATURE_COUNT];
            for i in 0..FEATURE_COUNT {
                x[i] = (row[i] - means[i]) / scales[i];
            }
            x
        })
        .collect();

    let mut weights = [0.0; FEATURE_COUNT];
    let mut bias = 0.0;
    for _ in 0..params.iterations {
        let mut grad_w = [0.0; FEATURE_COUNT];
        let mut grad_b = 0.0;
        for (x, y) in standardized.iter().zip(&targets) {
            let mut z = bias;
            for i in 0..FEATURE_COUNT {
                z += weights[i] * x[i];
            }
            let err = sigmoid(z) - y;
            for i in 0..FEATURE_COUNT {
                grad_w[i] += err * x[i] / n;
            }
            grad_b += err / n;
        }
        for i in 0..FEATURE_COUNT {
            weights[i] -= params.learning_rate * (grad_w[i] + params.l2 * weights[i]);
        }
        bias -= params.learning_rate * grad_b;
    }

    Ok(LogisticModel {
        weights,
        bias,
        means,
        scales,
        warning_threshold: DEFAULT_WARNING_THRESHOLD,
    })
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// On-disk form of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub trained_at: Timestamp,
    /// Number of samples the model was trained on.
    pub samples: usize,
    pub model: LogisticModel,
}

impl ModelArtifact {
    pub fn new(model: LogisticModel, samples: usize) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            trained_at: chrono::Utc::now(),
            samples,
            model,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Ten healthy rows (label 0) and ten overheated rows (label 1).
    pub(crate) fn sample_training_set() -> (Vec<Vec<f64>>, Vec<i64>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            let jitter = i as f64 * 0.5;
            features.push(vec![22.0 + jitter, 23.0 + jitter * 0.2, 1.0, 0.02, -0.08]);
            labels.push(0);
            features.push(vec![70.0 + jitter, 40.0 + jitter * 0.2, 1.05, 0.03, -0.07]);
            labels.push(1);
        }
        (features, labels)
    }

    #[test]
    fn trained_model_separates_hot_panels() {
        let (features, labels) = sample_training_set();
        let model = train(&features, &labels, TrainingParams::default()).expect("should train");

        let normal = model.predict(&[24.0, 23.5, 1.0, 0.02, -0.08]);
        assert_eq!(normal.raw_class, CLASS_NORMAL);
        assert!(normal.score > 0.5);

        let fault = model.predict(&[74.0, 41.0, 1.05, 0.03, -0.07]);
        assert_eq!(fault.raw_class, CLASS_FAULT);
        assert!(fault.score >= FAULT_PROBABILITY);
    }

    #[test]
    fn training_is_deterministic() {
        let (features, labels) = sample_training_set();
        let a = train(&features, &labels, TrainingParams::default()).unwrap();
        let b = train(&features, &labels, TrainingParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn warning_band_sits_between_normal_and_fault() {
        let model = LogisticModel {
            weights: [0.0; FEATURE_COUNT],
            bias: -0.2, // sigmoid(-0.2) ~= 0.45
            means: [0.0; FEATURE_COUNT],
            scales: [1.0; FEATURE_COUNT],
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
        };
        let prediction = model.predict(&[1.0; FEATURE_COUNT]);
        assert_eq!(prediction.raw_class, CLASS_WARNING);
        assert_eq!(FaultClass::from_raw(prediction.raw_class), Some(FaultClass::Warning));
    }

    #[test]
    fn rejects_empty_sets() {
        assert_eq!(
            train(&[], &[], TrainingParams::default()),
            Err(TrainingError::Empty)
        );
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let (features, mut labels) = sample_training_set();
        labels.pop();
        assert_matches!(
            train(&features, &labels, TrainingParams::default()),
            Err(TrainingError::LengthMismatch { features: 20, labels: 19 })
        );
    }

    #[test]
    fn rejects_short_rows() {
        let (mut features, labels) = sample_training_set();
        features[3] = vec![25.0, 40.0, 0.5];
        assert_matches!(
            train(&features, &labels, TrainingParams::default()),
            Err(TrainingError::RowWidth { row: 3, width: 3 })
        );
    }

    #[test]
    fn rejects_labels_outside_binary_set() {
        let (features, mut labels) = sample_training_set();
        labels[0] = 2;
        assert_matches!(
            train(&features, &labels, TrainingParams::default()),
            Err(TrainingError::InvalidLabel { index: 0, label: 2 })
        );
    }

    #[test]
    fn rejects_single_class() {
        let (features, _) = sample_training_set();
        let labels = vec![0; features.len()];
        assert_eq!(
            train(&features, &labels, TrainingParams::default()),
            Err(TrainingError::SingleClass)
        );
    }

    #[test]
    fn artifact_survives_serialization() {
        let (features, labels) = sample_training_set();
        let model = train(&features, &labels, TrainingParams::default()).unwrap();
        let artifact = ModelArtifact::new(model, features.len());
        let bytes = artifact.to_bytes().unwrap();
        let restored = ModelArtifact::from_bytes(&bytes).unwrap();
        assert_eq!(restored.format_version, ARTIFACT_FORMAT_VERSION);
        assert_eq!(restored.samples, 20);
        for (a, b) in restored.model.weights.iter().zip(&artifact.model.weights) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn unknown_raw_class_has_no_fault_class() {
        assert_eq!(FaultClass::from_raw(7), None);
    }
}
