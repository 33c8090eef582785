use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info, warn};

use super::day_tracker::{ClockRequest, DayState, DayWindow, plan_clock_in, plan_clock_out};
use super::error::AttendanceError;
use super::geofence::{GeofenceCheck, is_within_office};
use crate::model::attendance::AttendanceRecord;
use crate::model::office::{GeoPoint, OfficeConfig};
use crate::store::AttendanceStore;

/// Geofence verdict plus the configuration it was computed against.
#[derive(Debug, Clone)]
pub struct LocationCheck {
    pub check: GeofenceCheck,
    pub config: OfficeConfig,
}

pub async fn check_location(
    store: &dyn AttendanceStore,
    position: GeoPoint,
) -> Result<LocationCheck, AttendanceError> {
    let config = store.load_office_config().await?;
    let check = is_within_office(position, &config);
    Ok(LocationCheck { check, config })
}

/// Clocks `user_id` in at `now`. `now`'s time zone defines the calendar day.
pub async fn clock_in<Tz: TimeZone>(
    store: &dyn AttendanceStore,
    user_id: &str,
    position: GeoPoint,
    now: DateTime<Tz>,
) -> Result<AttendanceRecord, AttendanceError> {
    let window = DayWindow::today(&now);
    let LocationCheck { check, config } = check_location(store, position).await?;
    let req = ClockRequest {
        user_id,
        position,
        now: now.with_timezone(&Utc),
        window,
        config: &config,
        check,
    };

    if let Err(e) = req.ensure_in_range() {
        warn!(user_id, distance = check.distance, radius = config.radius_meters, "Clock-in outside office");
        return Err(e);
    }

    let existing = store.load_today_record(user_id, window).await?;
    let new_record = plan_clock_in(DayState::of(existing.as_ref()), &req)?;

    let record = store.insert_record(new_record).await?;
    info!(user_id, attendance_id = record.id, distance = check.distance, "Clocked in");
    Ok(record)
}

/// Clocks `user_id` out at `now`, completing today's open record.
pub async fn clock_out<Tz: TimeZone>(
    store: &dyn AttendanceStore,
    user_id: &str,
    position: GeoPoint,
    now: DateTime<Tz>,
) -> Result<AttendanceRecord, AttendanceError> {
    let window = DayWindow::today(&now);
    let LocationCheck { check, config } = check_location(store, position).await?;
    let req = ClockRequest {
        user_id,
        position,
        now: now.with_timezone(&Utc),
        window,
        config: &config,
        check,
    };

    if let Err(e) = req.ensure_in_range() {
        warn!(user_id, distance = check.distance, radius = config.radius_meters, "Clock-out outside office");
        return Err(e);
    }

    let Some(mut record) = store.load_today_record(user_id, window).await? else {
        return Err(AttendanceError::NotClockedIn);
    };
    let (id, check_out_time) = plan_clock_out(DayState::of(Some(&record)), &req)?;

    if !store.complete_record(id, check_out_time).await? {
        debug!(user_id, attendance_id = id, "Record completed concurrently");
        return Err(AttendanceError::AlreadyProcessed);
    }

    record.check_out_time = Some(check_out_time);
    info!(user_id, attendance_id = id, distance = check.distance, "Clocked out");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use crate::store::memory::MemoryStore;
    use crate::tracking::geofence::EARTH_RADIUS_METERS;
    use chrono::{Duration, FixedOffset};

    fn office() -> OfficeConfig {
        OfficeConfig::default()
    }

    fn meters_north(meters: f64) -> GeoPoint {
        let center = office().center;
        GeoPoint::new(
            center.latitude + (meters / EARTH_RADIUS_METERS).to_degrees(),
            center.longitude,
        )
    }

    fn morning() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-03-09T08:00:00+07:00").unwrap()
    }

    #[actix_web::test]
    async fn clock_in_at_the_office_center_creates_todays_record() {
        let store = MemoryStore::default();
        let now = morning();

        let record = clock_in(&store, "u-1", office().center, now).await.unwrap();

        assert_eq!(record.check_in_time, Some(now.with_timezone(&Utc)));
        assert_eq!(record.check_out_time, None);
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.work_date, DayWindow::today(&now).start);
        assert_eq!(store.records().len(), 1);
    }

    #[actix_web::test]
    async fn clock_in_from_500m_away_is_out_of_range_and_writes_nothing() {
        let store = MemoryStore::default();

        let err = clock_in(&store, "u-1", meters_north(500.0), morning())
            .await
            .unwrap_err();

        match err {
            AttendanceError::OutOfRange {
                distance, radius, ..
            } => {
                assert!((distance - 500.0).abs() < 1.0);
                assert_eq!(radius, 100.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(store.records().is_empty());
    }

    #[actix_web::test]
    async fn disabled_geofence_lets_anyone_clock_in() {
        let store = MemoryStore::with_config(OfficeConfig {
            enabled: false,
            ..office()
        });

        let record = clock_in(&store, "u-1", meters_north(50_000.0), morning()).await;
        assert!(record.is_ok());
    }

    #[actix_web::test]
    async fn clock_out_completes_the_open_record() {
        let store = MemoryStore::default();
        let check_in = morning();
        let check_out = check_in + Duration::hours(9);

        clock_in(&store, "u-1", office().center, check_in).await.unwrap();
        let record = clock_out(&store, "u-1", meters_north(80.0), check_out)
            .await
            .unwrap();

        assert_eq!(record.check_in_time, Some(check_in.with_timezone(&Utc)));
        assert_eq!(record.check_out_time, Some(check_out.with_timezone(&Utc)));
        assert_eq!(store.records()[0].check_out_time, record.check_out_time);
    }

    #[actix_web::test]
    async fn completed_day_refuses_another_clock_in() {
        let store = MemoryStore::default();
        let now = morning();

        clock_in(&store, "u-1", office().center, now).await.unwrap();
        clock_out(&store, "u-1", office().center, now + Duration::hours(8))
            .await
            .unwrap();

        let err = clock_in(&store, "u-1", office().center, now + Duration::hours(9))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyProcessed));

        let err = clock_out(&store, "u-1", office().center, now + Duration::hours(9))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyProcessed));
    }

    #[actix_web::test]
    async fn clock_out_without_clock_in_is_refused() {
        let store = MemoryStore::default();

        let err = clock_out(&store, "u-1", office().center, morning())
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NotClockedIn));
    }

    #[actix_web::test]
    async fn yesterdays_open_record_does_not_count_for_today() {
        let store = MemoryStore::default();
        let yesterday = morning() - Duration::days(1);

        clock_in(&store, "u-1", office().center, yesterday).await.unwrap();

        let err = clock_out(&store, "u-1", office().center, morning())
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NotClockedIn));

        clock_in(&store, "u-1", office().center, morning()).await.unwrap();
        assert_eq!(store.records().len(), 2);
    }

    #[actix_web::test]
    async fn users_are_tracked_independently() {
        let store = MemoryStore::default();

        clock_in(&store, "u-1", office().center, morning()).await.unwrap();
        clock_in(&store, "u-2", office().center, morning()).await.unwrap();

        assert_eq!(store.records().len(), 2);
    }

    #[actix_web::test]
    async fn insert_race_surfaces_as_already_processed() {
        let store = MemoryStore::default();
        clock_in(&store, "u-1", office().center, morning()).await.unwrap();
        // the second request read "no record" before the first one wrote
        store.hide_records_from_reads(true);

        let err = clock_in(&store, "u-1", office().center, morning())
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyProcessed));
        assert_eq!(store.records().len(), 1);
    }
}
