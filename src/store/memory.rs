//! In-process `AttendanceStore` for tests. Enforces the same
//! one-record-per-user-per-day rule as the database unique key.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AttendanceStore, StoreError, StoreResult};
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::office::OfficeConfig;
use crate::tracking::day_tracker::DayWindow;

#[derive(Default)]
pub struct MemoryStore {
    config: Mutex<Option<OfficeConfig>>,
    records: Mutex<Vec<AttendanceRecord>>,
    hide_records: AtomicBool,
}

impl MemoryStore {
    pub fn with_config(config: OfficeConfig) -> Self {
        Self {
            config: Mutex::new(Some(config)),
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Makes `load_today_record` report nothing, simulating a stale read.
    pub fn hide_records_from_reads(&self, hide: bool) {
        self.hide_records.store(hide, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn load_office_config(&self) -> StoreResult<OfficeConfig> {
        Ok(self.config.lock().unwrap().clone().unwrap_or_default())
    }

    async fn save_office_config(&self, config: &OfficeConfig) -> StoreResult<()> {
        *self.config.lock().unwrap() = Some(config.clone());
        Ok(())
    }

    async fn load_today_record(
        &self,
        user_id: &str,
        window: DayWindow,
    ) -> StoreResult<Option<AttendanceRecord>> {
        if self.hide_records.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && window.contains(r.work_date))
            .cloned())
    }

    async fn insert_record(&self, record: NewAttendance) -> StoreResult<AttendanceRecord> {
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.user_id == record.user_id && r.work_date == record.work_date)
        {
            return Err(StoreError::Duplicate);
        }

        let record = record.into_record(records.len() as u64 + 1);
        records.push(record.clone());
        Ok(record)
    }

    async fn complete_record(&self, id: u64, check_out_time: DateTime<Utc>) -> StoreResult<bool> {
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.id == id && r.check_out_time.is_none())
        {
            Some(record) => {
                record.check_out_time = Some(check_out_time);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
