use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::office::GeoPoint;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

/// One user's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "5d0c6f6e-6a53-4c86-9d3a-0b1f0f3c1a11")]
    pub user_id: String,
    /// Local midnight of the attendance day
    #[schema(example = "2026-01-04T17:00:00Z", format = "date-time", value_type = String)]
    pub work_date: DateTime<Utc>,
    #[schema(example = "2026-01-05T01:58:12Z", format = "date-time", value_type = Option<String>)]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-05T10:03:40Z", format = "date-time", value_type = Option<String>)]
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    /// Position reported at check-in
    pub position: GeoPoint,
    pub notes: Option<String>,
}

impl AttendanceRecord {
    pub fn is_completed(&self) -> bool {
        self.check_out_time.is_some()
    }
}

/// A record about to be inserted by a clock-in.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub user_id: String,
    pub work_date: DateTime<Utc>,
    pub check_in_time: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub position: GeoPoint,
}

impl NewAttendance {
    pub fn into_record(self, id: u64) -> AttendanceRecord {
        AttendanceRecord {
            id,
            user_id: self.user_id,
            work_date: self.work_date,
            check_in_time: Some(self.check_in_time),
            check_out_time: None,
            status: self.status,
            position: self.position,
            notes: None,
        }
    }
}
