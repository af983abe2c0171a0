/// Panels are keyed by the identifier they report in every reading.
pub type PanelId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Unix seconds, as carried on persisted status records.
pub type UnixSeconds = i64;

/// Number of sensor channels in a reading.
pub const FEATURE_COUNT: usize = 5;

/// Feature vector in the fixed channel order
/// `[surface_temp, ambient_temp, accel_x, accel_y, accel_z]`.
pub type FeatureVector = [f64; FEATURE_COUNT];
