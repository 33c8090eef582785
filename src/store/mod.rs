//! Persistence port for the clock-in/clock-out flow.
//!
//! The decision logic in `tracking` only ever sees already-fetched data; this
//! trait is the async boundary it is fed from and written back through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::office::OfficeConfig;
use crate::tracking::day_tracker::DayWindow;

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The `(user_id, work_date)` unique key rejected the insert.
    #[error("attendance record already exists for this day")]
    Duplicate,
    #[error("stored value is malformed: {0}")]
    Malformed(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Returns the saved office configuration, or the built-in default when
    /// none has been saved yet.
    async fn load_office_config(&self) -> StoreResult<OfficeConfig>;

    /// Replaces the whole office configuration (insert if absent).
    async fn save_office_config(&self, config: &OfficeConfig) -> StoreResult<()>;

    /// The user's record whose `work_date` falls inside `window`, if any.
    async fn load_today_record(
        &self,
        user_id: &str,
        window: DayWindow,
    ) -> StoreResult<Option<AttendanceRecord>>;

    async fn insert_record(&self, record: NewAttendance) -> StoreResult<AttendanceRecord>;

    /// Sets `check_out_time` on a still-open record. Returns `false` when the
    /// record was already completed (or does not exist).
    async fn complete_record(&self, id: u64, check_out_time: DateTime<Utc>) -> StoreResult<bool>;
}
