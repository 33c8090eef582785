use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Settings key under which the office geofence is stored.
pub const OFFICE_CONFIG_KEY: &str = "office_config";

pub const DEFAULT_OFFICE_LATITUDE: f64 = -6.2;
pub const DEFAULT_OFFICE_LONGITUDE: f64 = 106.816666;
pub const DEFAULT_OFFICE_RADIUS_METERS: f64 = 100.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[display(fmt = "{:.6}, {:.6}", latitude, longitude)]
pub struct GeoPoint {
    #[schema(example = -6.2)]
    pub latitude: f64,
    #[schema(example = 106.816666)]
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both coordinates are finite and inside the WGS-84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

fn default_enabled() -> bool {
    true
}

/// Office geofence. Serialized flat as `{latitude, longitude, radius, enabled}`,
/// which is also the stored settings value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OfficeConfig {
    #[serde(flatten)]
    pub center: GeoPoint,
    #[serde(rename = "radius")]
    #[schema(example = 100.0)]
    pub radius_meters: f64,
    /// Rows written before the flag existed are treated as enabled.
    #[serde(default = "default_enabled")]
    #[schema(example = true)]
    pub enabled: bool,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            center: GeoPoint::new(DEFAULT_OFFICE_LATITUDE, DEFAULT_OFFICE_LONGITUDE),
            radius_meters: DEFAULT_OFFICE_RADIUS_METERS,
            enabled: true,
        }
    }
}

impl OfficeConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.center.is_valid() {
            return Err("Office coordinates are out of range");
        }
        if !self.radius_meters.is_finite() || self.radius_meters <= 0.0 {
            return Err("radius must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_value_without_enabled_flag_defaults_to_enabled() {
        let config: OfficeConfig =
            serde_json::from_str(r#"{"latitude":-6.3,"longitude":106.9,"radius":250}"#).unwrap();

        assert_eq!(config.center, GeoPoint::new(-6.3, 106.9));
        assert_eq!(config.radius_meters, 250.0);
        assert!(config.enabled);
    }

    #[test]
    fn serializes_flat() {
        let value = serde_json::to_value(OfficeConfig::default()).unwrap();
        assert_eq!(value["latitude"], -6.2);
        assert_eq!(value["longitude"], 106.816666);
        assert_eq!(value["radius"], 100.0);
        assert_eq!(value["enabled"], true);
    }

    #[test]
    fn validation_rejects_bad_radius_and_coordinates() {
        let mut config = OfficeConfig::default();
        assert!(config.validate().is_ok());

        config.radius_meters = 0.0;
        assert!(config.validate().is_err());

        config.radius_meters = 50.0;
        config.center = GeoPoint::new(91.0, 0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn display_uses_six_decimals() {
        assert_eq!(GeoPoint::new(-6.2, 106.816666).to_string(), "-6.200000, 106.816666");
    }
}
