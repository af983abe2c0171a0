//! Reading validation.
//!
//! Pure logic: [`validate`] checks a raw [`Reading`] against structural and
//! range rules and either accepts it (with a normalized copy and any warning
//! notes) or rejects it with a reason and category. Rules run in a fixed
//! order and the first rejecting rule wins.

use serde::Serialize;

use crate::reading::{NormalizedReading, Reading, SensorChannel};

/// Absolute values below this are treated as a disconnected or stuck sensor.
///
/// A genuine zero reading trips this too; that false positive is accepted.
pub const DISCONNECT_EPSILON: f64 = 0.001;

/// Hard and soft limits for one channel.
///
/// Outside `hard` rejects the reading; outside `soft` only warns.
#[derive(Debug, Clone, Copy)]
pub struct RangeLimits {
    pub hard_min: f64,
    pub hard_max: f64,
    pub soft_min: f64,
    pub soft_max: f64,
}

impl RangeLimits {
    fn violates_hard(&self, value: f64) -> bool {
        value < self.hard_min || value > self.hard_max
    }

    fn violates_soft(&self, value: f64) -> bool {
        value < self.soft_min || value > self.soft_max
    }
}

pub const SURFACE_TEMP_LIMITS: RangeLimits = RangeLimits {
    hard_min: -15.0,
    hard_max: 85.0,
    soft_min: -10.0,
    soft_max: 75.0,
};

pub const AMBIENT_TEMP_LIMITS: RangeLimits = RangeLimits {
    hard_min: -20.0,
    hard_max: 55.0,
    soft_min: -10.0,
    soft_max: 45.0,
};

/// Acceleration limits apply to the magnitude of each axis independently.
pub const ACCEL_LIMITS: RangeLimits = RangeLimits {
    hard_min: -2.0,
    hard_max: 2.0,
    soft_min: -1.0,
    soft_max: 1.0,
};

/// Why a reading was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCategory {
    Missing,
    Disconnected,
    RangeFault,
}

/// Result of validating one reading.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Accepted {
        normalized: NormalizedReading,
        warnings: Vec<String>,
    },
    Rejected {
        reason: String,
        category: RejectionCategory,
    },
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted { .. })
    }

    fn rejected(category: RejectionCategory, reason: String) -> Self {
        ValidationOutcome::Rejected { reason, category }
    }
}

/// Validate a raw reading.
///
/// Rule order:
/// 1. panel id and all five channels present
/// 2. no channel stuck at zero
/// 3. surface temperature range
/// 4. ambient temperature range
/// 5. each acceleration axis
pub fn validate(reading: &Reading) -> ValidationOutcome {
    let panel_present = reading
        .panel_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    if !panel_present {
        return ValidationOutcome::rejected(
            RejectionCategory::Missing,
            "panel_id missing or null".to_string(),
        );
    }

    let mut values = [0.0; 5];
    for (slot, channel) in values.iter_mut().zip(SensorChannel::ALL) {
        match reading.channel(channel) {
            Some(value) if value.is_finite() => *slot = value,
            _ => {
                return ValidationOutcome::rejected(
                    RejectionCategory::Missing,
                    format!("{channel} missing or null"),
                )
            }
        }
    }

    for (value, channel) in values.iter().zip(SensorChannel::ALL) {
        if value.abs() < DISCONNECT_EPSILON {
            return ValidationOutcome::rejected(
                RejectionCategory::Disconnected,
                format!("{channel} possibly disconnected (value={value})"),
            );
        }
    }

    let normalized = NormalizedReading {
        surface_temp: values[0],
        ambient_temp: values[1],
        accel_x: values[2],
        accel_y: values[3],
        accel_z: values[4],
    };
    let mut warnings = Vec::new();

    let temperature_checks = [
        ("Surface temperature", normalized.surface_temp, SURFACE_TEMP_LIMITS),
        ("Ambient temperature", normalized.ambient_temp, AMBIENT_TEMP_LIMITS),
    ];
    for (label, value, limits) in temperature_checks {
        if limits.violates_hard(value) {
            return ValidationOutcome::rejected(
                RejectionCategory::RangeFault,
                format!("{label} fault (value: {value})"),
            );
        }
        if limits.violates_soft(value) {
            warnings.push(format!("{label} warning (value: {value})"));
        }
    }

    for axis in [
        SensorChannel::AccelX,
        SensorChannel::AccelY,
        SensorChannel::AccelZ,
    ] {
        let value = normalized.channel(axis);
        if ACCEL_LIMITS.violates_hard(value) {
            return ValidationOutcome::rejected(
                RejectionCategory::RangeFault,
                format!("{axis} fault (value: {value})"),
            );
        }
        if ACCEL_LIMITS.violates_soft(value) {
            warnings.push(format!("{axis} warning (value: {value})"));
        }
    }

    ValidationOutcome::Accepted {
        normalized,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
