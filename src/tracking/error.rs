use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::model::office::GeoPoint;
use crate::store::StoreError;

/// Outcome of a refused clock-in/clock-out. Everything except `Store` is a
/// user-facing result the client can retry.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error(
        "You are outside the office area. Distance: {distance:.0}m (Max: {radius}m). Detected location: {position}"
    )]
    OutOfRange {
        distance: f64,
        radius: f64,
        position: GeoPoint,
    },

    #[error("Attendance for today has already been recorded")]
    AlreadyProcessed,

    #[error("You have not clocked in today")]
    NotClockedIn,

    #[error("Attendance store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AttendanceError {
    fn from(err: StoreError) -> Self {
        match err {
            // lost the insert race against a concurrent clock-in for the same day
            StoreError::Duplicate => AttendanceError::AlreadyProcessed,
            other => AttendanceError::Store(other),
        }
    }
}

impl AttendanceError {
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::OutOfRange { .. } => "out_of_range",
            AttendanceError::AlreadyProcessed => "already_processed",
            AttendanceError::NotClockedIn => "not_clocked_in",
            AttendanceError::Store(_) => "internal_error",
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::OutOfRange { .. } => StatusCode::FORBIDDEN,
            AttendanceError::AlreadyProcessed | AttendanceError::NotClockedIn => {
                StatusCode::BAD_REQUEST
            }
            AttendanceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AttendanceError::OutOfRange {
                distance,
                radius,
                position,
            } => json!({
                "code": self.code(),
                "message": self.to_string(),
                "distance": distance.round(),
                "radius": radius,
                "latitude": position.latitude,
                "longitude": position.longitude,
            }),
            // never leak database details to the client
            AttendanceError::Store(_) => json!({
                "code": self.code(),
                "message": "Internal Server Error",
            }),
            _ => json!({
                "code": self.code(),
                "message": self.to_string(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn duplicate_insert_becomes_already_processed() {
        let err = AttendanceError::from(StoreError::Duplicate);
        assert!(matches!(err, AttendanceError::AlreadyProcessed));

        let err = AttendanceError::from(StoreError::Malformed("x".into()));
        assert!(matches!(err, AttendanceError::Store(_)));
    }

    #[test]
    fn out_of_range_message_explains_distance_and_radius() {
        let err = AttendanceError::OutOfRange {
            distance: 499.6,
            radius: 100.0,
            position: GeoPoint::new(-6.195504, 106.816666),
        };
        assert_eq!(
            err.to_string(),
            "You are outside the office area. Distance: 500m (Max: 100m). Detected location: -6.195504, 106.816666"
        );
    }

    #[actix_web::test]
    async fn out_of_range_renders_forbidden_with_details() {
        let err = AttendanceError::OutOfRange {
            distance: 512.4,
            radius: 100.0,
            position: GeoPoint::new(-6.2, 106.82),
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "out_of_range");
        assert_eq!(json["distance"], 512.0);
        assert_eq!(json["radius"], 100.0);
    }

    #[actix_web::test]
    async fn store_failure_hides_details() {
        let err = AttendanceError::Store(StoreError::Malformed("secret column".into()));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("secret column"));
    }
}
