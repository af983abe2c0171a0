//! Telemetry readings as received from panels and after validation.

use serde::{Deserialize, Serialize};

use crate::types::{FeatureVector, UnixSeconds};

/// Panel id used for readings that carry no usable identifier.
pub const UNKNOWN_PANEL_ID: &str = "unknown";

/// One telemetry sample exactly as a panel reported it.
///
/// Every field is optional on the wire; the validator decides whether the
/// reading is complete enough to classify.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub panel_id: Option<String>,
    pub surface_temp: Option<f64>,
    pub ambient_temp: Option<f64>,
    pub accel_x: Option<f64>,
    pub accel_y: Option<f64>,
    pub accel_z: Option<f64>,
    /// Sample time reported by the panel, in unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<UnixSeconds>,
}

impl Reading {
    /// The panel id if it identifies an installed panel.
    ///
    /// Absent, blank and `"unknown"` ids all mean the panel has not been
    /// installed yet.
    pub fn installed_panel_id(&self) -> Option<&str> {
        self.panel_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != UNKNOWN_PANEL_ID)
    }

    /// Value of a single channel, if present.
    pub fn channel(&self, channel: SensorChannel) -> Option<f64> {
        match channel {
            SensorChannel::SurfaceTemp => self.surface_temp,
            SensorChannel::AmbientTemp => self.ambient_temp,
            SensorChannel::AccelX => self.accel_x,
            SensorChannel::AccelY => self.accel_y,
            SensorChannel::AccelZ => self.accel_z,
        }
    }
}

/// A reading that passed structural validation: every channel is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedReading {
    pub surface_temp: f64,
    pub ambient_temp: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
}

impl NormalizedReading {
    /// Feature vector in [`SensorChannel::ALL`] order.
    pub fn features(&self) -> FeatureVector {
        [
            self.surface_temp,
            self.ambient_temp,
            self.accel_x,
            self.accel_y,
            self.accel_z,
        ]
    }

    pub fn channel(&self, channel: SensorChannel) -> f64 {
        match channel {
            SensorChannel::SurfaceTemp => self.surface_temp,
            SensorChannel::AmbientTemp => self.ambient_temp,
            SensorChannel::AccelX => self.accel_x,
            SensorChannel::AccelY => self.accel_y,
            SensorChannel::AccelZ => self.accel_z,
        }
    }
}

/// The five sensor channels of a panel, in fixed feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorChannel {
    SurfaceTemp,
    AmbientTemp,
    AccelX,
    AccelY,
    AccelZ,
}

impl SensorChannel {
    /// All channels in feature order. Also the tie-break order for attribution.
    pub const ALL: [SensorChannel; 5] = [
        SensorChannel::SurfaceTemp,
        SensorChannel::AmbientTemp,
        SensorChannel::AccelX,
        SensorChannel::AccelY,
        SensorChannel::AccelZ,
    ];

    /// Field name as it appears in the ingest payload.
    pub fn field_name(self) -> &'static str {
        match self {
            SensorChannel::SurfaceTemp => "surface_temp",
            SensorChannel::AmbientTemp => "ambient_temp",
            SensorChannel::AccelX => "accel_x",
            SensorChannel::AccelY => "accel_y",
            SensorChannel::AccelZ => "accel_z",
        }
    }
}

impl std::fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installed_panel_id_rejects_blank_and_unknown() {
        let mut reading = Reading::default();
        assert_eq!(reading.installed_panel_id(), None);

        reading.panel_id = Some("   ".into());
        assert_eq!(reading.installed_panel_id(), None);

        reading.panel_id = Some("unknown".into());
        assert_eq!(reading.installed_panel_id(), None);

        reading.panel_id = Some(" P-7 ".into());
        assert_eq!(reading.installed_panel_id(), Some("P-7"));
    }

    #[test]
    fn deserializes_flat_payload_with_missing_fields() {
        let reading: Reading =
            serde_json::from_str(r#"{"panel_id":"P1","surface_temp":21.5,"accel_x":null}"#)
                .expect("payload should parse");
        assert_eq!(reading.panel_id.as_deref(), Some("P1"));
        assert_eq!(reading.surface_temp, Some(21.5));
        assert_eq!(reading.accel_x, None);
        assert_eq!(reading.ambient_temp, None);
    }

    #[test]
    fn features_follow_channel_order() {
        let reading = NormalizedReading {
            surface_temp: 1.0,
            ambient_temp: 2.0,
            accel_x: 3.0,
            accel_y: 4.0,
            accel_z: 5.0,
        };
        let features = reading.features();
        for (i, channel) in SensorChannel::ALL.iter().enumerate() {
            assert_eq!(features[i], reading.channel(*channel));
        }
    }
}
