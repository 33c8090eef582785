//! Great-circle distance and the office perimeter check used by both
//! clock-in and clock-out.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::office::{GeoPoint, OfficeConfig};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters.
///
/// Coordinates are not range checked; any finite input gives a finite result.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // rounding can push h a hair above 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GeofenceCheck {
    pub allowed: bool,
    /// Meters from the office center; 0 when geofencing is disabled
    pub distance: f64,
}

/// Decides whether `position` lies inside the office radius (boundary inclusive).
pub fn is_within_office(position: GeoPoint, config: &OfficeConfig) -> GeofenceCheck {
    if !config.enabled {
        return GeofenceCheck {
            allowed: true,
            distance: 0.0,
        };
    }

    let distance = distance_meters(position, config.center);
    GeofenceCheck {
        allowed: distance <= config.radius_meters,
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office(radius_meters: f64) -> OfficeConfig {
        OfficeConfig {
            center: GeoPoint::new(-6.2, 106.816666),
            radius_meters,
            enabled: true,
        }
    }

    /// Point `meters` due north of `origin` along the meridian.
    fn north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
        let degrees = (meters / EARTH_RADIUS_METERS).to_degrees();
        GeoPoint::new(origin.latitude + degrees, origin.longitude)
    }

    #[test]
    fn distance_to_self_is_zero() {
        for p in [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(-6.2, 106.816666),
            GeoPoint::new(89.9, -179.9),
        ] {
            assert_eq!(distance_meters(p, p), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let jakarta = GeoPoint::new(-6.2, 106.816666);
        let bandung = GeoPoint::new(-6.914744, 107.609810);
        let london = GeoPoint::new(51.5074, -0.1278);

        assert_eq!(distance_meters(jakarta, bandung), distance_meters(bandung, jakarta));
        assert_eq!(distance_meters(jakarta, london), distance_meters(london, jakarta));
    }

    #[test]
    fn one_degree_of_latitude_at_the_equator() {
        let d = distance_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn distance_grows_with_separation() {
        let origin = GeoPoint::new(-6.2, 106.816666);
        let mut last = 0.0;
        for step in 1..=10 {
            let d = distance_meters(origin, GeoPoint::new(-6.2 + step as f64 * 0.01, 106.816666));
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn antipodal_points_are_half_the_circumference_apart() {
        let d = distance_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half).abs() < 1.0);
    }

    #[test]
    fn out_of_range_input_still_gives_a_finite_distance() {
        let d = distance_meters(GeoPoint::new(120.0, 400.0), GeoPoint::new(-95.0, -200.0));
        assert!(d.is_finite());
        assert!(d >= 0.0);
    }

    #[test]
    fn center_is_allowed() {
        let config = office(100.0);
        let check = is_within_office(config.center, &config);
        assert!(check.allowed);
        assert_eq!(check.distance, 0.0);
    }

    #[test]
    fn boundary_is_inclusive() {
        let position = north_of(GeoPoint::new(-6.2, 106.816666), 100.0);
        let config = office(distance_meters(position, GeoPoint::new(-6.2, 106.816666)));

        let check = is_within_office(position, &config);
        assert_eq!(check.distance, config.radius_meters);
        assert!(check.allowed);
    }

    #[test]
    fn outside_radius_is_rejected() {
        let config = office(100.0);
        let position = north_of(config.center, 500.0);

        let check = is_within_office(position, &config);
        assert!(!check.allowed);
        assert!((check.distance - 500.0).abs() < 1.0);
    }

    #[test]
    fn disabled_geofence_allows_anywhere() {
        let mut config = office(100.0);
        config.enabled = false;

        let check = is_within_office(GeoPoint::new(51.5074, -0.1278), &config);
        assert_eq!(
            check,
            GeofenceCheck {
                allowed: true,
                distance: 0.0
            }
        );
    }
}
