use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::{error, warn};

use super::{AttendanceStore, StoreError, StoreResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::office::{GeoPoint, OFFICE_CONFIG_KEY, OfficeConfig};
use crate::tracking::day_tracker::DayWindow;
use crate::utils::office_cache;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
pub(crate) struct AttendanceRow {
    id: u64,
    user_id: String,
    work_date: DateTime<Utc>,
    check_in_time: Option<DateTime<Utc>>,
    check_out_time: Option<DateTime<Utc>>,
    status: String,
    latitude: f64,
    longitude: f64,
    notes: Option<String>,
}

impl AttendanceRow {
    pub(crate) fn into_domain(self) -> StoreResult<AttendanceRecord> {
        let status = AttendanceStatus::from_str(&self.status)
            .map_err(|_| StoreError::Malformed(format!("attendance status '{}'", self.status)))?;

        Ok(AttendanceRecord {
            id: self.id,
            user_id: self.user_id,
            work_date: self.work_date,
            check_in_time: self.check_in_time,
            check_out_time: self.check_out_time,
            status,
            position: GeoPoint::new(self.latitude, self.longitude),
            notes: self.notes,
        })
    }
}

pub(crate) const ATTENDANCE_COLUMNS: &str = "id, user_id, work_date, check_in_time, check_out_time, status, latitude, longitude, notes";

pub(crate) fn is_duplicate(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn load_office_config(&self) -> StoreResult<OfficeConfig> {
        if let Some(config) = office_cache::get().await {
            return Ok(config);
        }

        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM settings WHERE setting_key = ?",
        )
        .bind(OFFICE_CONFIG_KEY)
        .fetch_optional(&self.pool)
        .await?;

        let config = match value {
            None => OfficeConfig::default(),
            Some(raw) => match serde_json::from_str::<OfficeConfig>(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, "Stored office config is malformed, using default");
                    OfficeConfig::default()
                }
            },
        };

        office_cache::put(config.clone()).await;
        Ok(config)
    }

    async fn save_office_config(&self, config: &OfficeConfig) -> StoreResult<()> {
        let value =
            serde_json::to_string(config).map_err(|e| StoreError::Malformed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO settings (setting_key, value, updated_at)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE value = VALUES(value), updated_at = VALUES(updated_at)
            "#,
        )
        .bind(OFFICE_CONFIG_KEY)
        .bind(&value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        office_cache::invalidate().await;
        Ok(())
    }

    async fn load_today_record(
        &self,
        user_id: &str,
        window: DayWindow,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance
            WHERE user_id = ?
            AND work_date >= ?
            AND work_date < ?
            ORDER BY id DESC
            LIMIT 1
            "#
        );

        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_optional(&self.pool)
            .await?;

        row.map(AttendanceRow::into_domain).transpose()
    }

    async fn insert_record(&self, record: NewAttendance) -> StoreResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (user_id, work_date, check_in_time, status, latitude, longitude)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.user_id)
        .bind(record.work_date)
        .bind(record.check_in_time)
        .bind(record.status.as_ref())
        .bind(record.position.latitude)
        .bind(record.position.longitude)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(record.into_record(done.last_insert_id())),
            Err(e) if is_duplicate(&e) => Err(StoreError::Duplicate),
            Err(e) => {
                error!(error = %e, user_id = %record.user_id, "Attendance insert failed");
                Err(e.into())
            }
        }
    }

    async fn complete_record(&self, id: u64, check_out_time: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?
            WHERE id = ?
            AND check_out_time IS NULL
            "#,
        )
        .bind(check_out_time)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
