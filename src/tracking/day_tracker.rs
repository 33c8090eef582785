//! Per-user, per-day attendance state and the clock-in/clock-out rules.
//!
//! `NoRecord --clock_in--> CheckedIn --clock_out--> Completed`; everything else
//! is refused. The geofence decision is passed in already evaluated, and is
//! checked before the day state.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use super::error::AttendanceError;
use super::geofence::GeofenceCheck;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::office::{GeoPoint, OfficeConfig};

/// Local midnight of `now`'s calendar day, and 24 hours after it.
pub fn today_window<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);

    // midnight skipped by a DST jump: the day starts at the first local
    // quarter hour that exists
    let start = (0..96)
        .find_map(|quarter| {
            let local = midnight + Duration::minutes(15 * quarter);
            tz.from_local_datetime(&local).earliest()
        })
        .unwrap_or_else(|| now.clone());
    let end = start.clone() + Duration::hours(24);

    (start, end)
}

/// Half-open `[start, end)` window in UTC used to look up today's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn today<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let (start, end) = today_window(now);
        Self {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        }
    }

    /// Window of an arbitrary calendar `date` in `tz`.
    pub fn for_date<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<Self> {
        let noon = tz.from_local_datetime(&date.and_hms_opt(12, 0, 0)?).earliest()?;
        Some(Self::today(&noon))
    }

    #[cfg(test)]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayState<'a> {
    NoRecord,
    CheckedIn(&'a AttendanceRecord),
    Completed(&'a AttendanceRecord),
}

impl<'a> DayState<'a> {
    pub fn of(record: Option<&'a AttendanceRecord>) -> Self {
        match record {
            None => DayState::NoRecord,
            Some(r) if r.is_completed() => DayState::Completed(r),
            Some(r) => DayState::CheckedIn(r),
        }
    }
}

/// Everything a clock-in/clock-out decision looks at.
pub struct ClockRequest<'a> {
    pub user_id: &'a str,
    pub position: GeoPoint,
    pub now: DateTime<Utc>,
    pub window: DayWindow,
    pub config: &'a OfficeConfig,
    pub check: GeofenceCheck,
}

impl ClockRequest<'_> {
    /// Fails with `OutOfRange` unless the geofence allowed the position.
    pub fn ensure_in_range(&self) -> Result<(), AttendanceError> {
        if self.check.allowed {
            Ok(())
        } else {
            Err(AttendanceError::OutOfRange {
                distance: self.check.distance,
                radius: self.config.radius_meters,
                position: self.position,
            })
        }
    }
}

/// Builds the record a legal clock-in creates. Status is always `present`.
pub fn plan_clock_in(
    state: DayState<'_>,
    req: &ClockRequest<'_>,
) -> Result<NewAttendance, AttendanceError> {
    req.ensure_in_range()?;

    match state {
        DayState::NoRecord => Ok(NewAttendance {
            user_id: req.user_id.to_string(),
            work_date: req.window.start,
            check_in_time: req.now,
            status: AttendanceStatus::Present,
            position: req.position,
        }),
        DayState::CheckedIn(_) | DayState::Completed(_) => Err(AttendanceError::AlreadyProcessed),
    }
}

/// Returns the open record's id and the check-out time to store on it.
pub fn plan_clock_out(
    state: DayState<'_>,
    req: &ClockRequest<'_>,
) -> Result<(u64, DateTime<Utc>), AttendanceError> {
    req.ensure_in_range()?;

    match state {
        DayState::NoRecord => Err(AttendanceError::NotClockedIn),
        DayState::Completed(_) => Err(AttendanceError::AlreadyProcessed),
        DayState::CheckedIn(record) => {
            // check-out never precedes check-in, even with a skewed clock
            let check_out = match record.check_in_time {
                Some(check_in) if check_in > req.now => check_in,
                _ => req.now,
            };
            Ok((record.id, check_out))
        }
    }
}
