//! Fault attribution.
//!
//! Given a reading the classifier flagged, pick the sensor channel that
//! deviates most from its healthy baseline and turn it into a cause string.

use serde::Serialize;

use crate::reading::{NormalizedReading, SensorChannel};

/// Healthy baseline per channel, in [`SensorChannel::ALL`] order.
pub const BASELINES: [(SensorChannel, f64); 5] = [
    (SensorChannel::SurfaceTemp, 23.5),
    (SensorChannel::AmbientTemp, 24.2),
    (SensorChannel::AccelX, 1.03),
    (SensorChannel::AccelY, 0.00),
    (SensorChannel::AccelZ, -0.08),
];

pub const CAUSE_SURFACE_TEMP: &str = "Surface temperature abnormal";
pub const CAUSE_AMBIENT_TEMP: &str = "Ambient temperature abnormal";
pub const CAUSE_ORIENTATION: &str = "Orientation/tilt abnormal";

/// The channel blamed for a warning or fault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub primary_sensor: SensorChannel,
    pub cause: String,
    /// Absolute deviation of `primary_sensor` from its baseline.
    pub deviation: f64,
}

pub fn cause_for(channel: SensorChannel) -> &'static str {
    match channel {
        SensorChannel::SurfaceTemp => CAUSE_SURFACE_TEMP,
        SensorChannel::AmbientTemp => CAUSE_AMBIENT_TEMP,
        SensorChannel::AccelX | SensorChannel::AccelY | SensorChannel::AccelZ => CAUSE_ORIENTATION,
    }
}

/// Attribute a flagged reading to the channel with the largest absolute
/// deviation from baseline. Ties go to the earliest channel in feature order.
pub fn attribute(reading: &NormalizedReading) -> Diagnosis {
    let (mut primary, baseline) = BASELINES[0];
    let mut max_deviation = (reading.channel(primary) - baseline).abs();

    for &(channel, baseline) in &BASELINES[1..] {
        let deviation = (reading.channel(channel) - baseline).abs();
        if deviation > max_deviation {
            primary = channel;
            max_deviation = deviation;
        }
    }

    Diagnosis {
        primary_sensor: primary,
        cause: cause_for(primary).to_string(),
        deviation: max_deviation,
    }
}
