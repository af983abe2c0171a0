//! Panel status records and the verdict-to-status mapping.
//!
//! A [`Verdict`] is the terminal outcome of one pipeline run. Mapping a
//! verdict to a [`ColorCode`] and status text is total and deterministic:
//!
//! | Verdict                   | Color  | Status text             |
//! |---------------------------|--------|-------------------------|
//! | not installed             | Gray   | Not installed yet       |
//! | validation rejected       | Purple | System error            |
//! | classifier failed         | Purple | System error            |
//! | classified Normal         | Blue   | Installed and healthy   |
//! | classified Warning        | Yellow | Warning                 |
//! | classified Fault          | Red    | Confirmed fault         |

use serde::{Deserialize, Serialize};

use crate::attribution::Diagnosis;
use crate::classifier::ClassificationResult;
use crate::model::FaultClass;
use crate::reading::Reading;
use crate::types::{PanelId, UnixSeconds};
use crate::validation::RejectionCategory;

pub const STATUS_NOT_INSTALLED: &str = "Not installed yet";
pub const STATUS_SYSTEM_ERROR: &str = "System error";
pub const STATUS_HEALTHY: &str = "Installed and healthy";
pub const STATUS_WARNING: &str = "Warning";
pub const STATUS_FAULT: &str = "Confirmed fault";

/// Prediction recorded when the classifier did not run.
pub const NO_PREDICTION: i64 = -1;

/// Rejection reasons containing any of these are blamed on the sensor;
/// everything else is a platform problem.
const SENSOR_KEYWORDS: [&str; 2] = ["disconnected", "fault"];

/// Five-level status taxonomy exposed to downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCode {
    Gray,
    Blue,
    Yellow,
    Red,
    Purple,
}

/// Which part of the system a Purple status is blamed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemErrorKind {
    Sensor,
    Platform,
    MlFailure,
}

/// Tag a rejection reason by keyword.
pub fn tag_rejection(reason: &str) -> SystemErrorKind {
    let lower = reason.to_lowercase();
    if SENSOR_KEYWORDS.iter().any(|k| lower.contains(k)) {
        SystemErrorKind::Sensor
    } else {
        SystemErrorKind::Platform
    }
}

/// Current status of one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelStatus {
    pub panel_id: PanelId,
    pub color_code: ColorCode,
    pub status_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<SystemErrorKind>,
    pub last_prediction: i64,
    pub timestamp_unix: UnixSeconds,
}

/// One processed reading and the status it produced. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub input: Reading,
    pub outcome: PanelStatus,
}

/// Terminal outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    NotInstalled,
    Rejected {
        category: RejectionCategory,
        reason: String,
    },
    ClassificationFailed {
        message: String,
    },
    Classified {
        result: ClassificationResult,
        diagnosis: Option<Diagnosis>,
    },
}

impl Verdict {
    pub fn color(&self) -> ColorCode {
        match self {
            Verdict::NotInstalled => ColorCode::Gray,
            Verdict::Rejected { .. } | Verdict::ClassificationFailed { .. } => ColorCode::Purple,
            Verdict::Classified { result, .. } => match result.class {
                FaultClass::Normal => ColorCode::Blue,
                FaultClass::Warning => ColorCode::Yellow,
                FaultClass::Fault => ColorCode::Red,
            },
        }
    }

    pub fn status_text(&self) -> &'static str {
        match self.color() {
            ColorCode::Gray => STATUS_NOT_INSTALLED,
            ColorCode::Purple => STATUS_SYSTEM_ERROR,
            ColorCode::Blue => STATUS_HEALTHY,
            ColorCode::Yellow => STATUS_WARNING,
            ColorCode::Red => STATUS_FAULT,
        }
    }

    pub fn error_kind(&self) -> Option<SystemErrorKind> {
        match self {
            Verdict::Rejected { reason, .. } => Some(tag_rejection(reason)),
            Verdict::ClassificationFailed { .. } => Some(SystemErrorKind::MlFailure),
            _ => None,
        }
    }

    /// Human-readable cause: the diagnosis for warnings and faults, the
    /// failure message for system errors.
    pub fn cause(&self) -> Option<String> {
        match self {
            Verdict::NotInstalled => None,
            Verdict::Rejected { reason, .. } => Some(reason.clone()),
            Verdict::ClassificationFailed { message } => Some(message.clone()),
            Verdict::Classified { result, diagnosis } => match result.class {
                FaultClass::Normal => None,
                FaultClass::Warning | FaultClass::Fault => {
                    diagnosis.as_ref().map(|d| d.cause.clone())
                }
            },
        }
    }

    pub fn prediction(&self) -> i64 {
        match self {
            Verdict::Classified { result, .. } => result.raw_prediction,
            _ => NO_PREDICTION,
        }
    }

    /// Build the status record this verdict produces for `panel_id`.
    pub fn to_status(&self, panel_id: impl Into<PanelId>, timestamp_unix: UnixSeconds) -> PanelStatus {
        PanelStatus {
            panel_id: panel_id.into(),
            color_code: self.color(),
            status_text: self.status_text().to_string(),
            cause: self.cause(),
            error_kind: self.error_kind(),
            last_prediction: self.prediction(),
            timestamp_unix,
        }
    }
}
