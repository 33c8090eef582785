//! Geofenced clock-in/clock-out: distance check, day-state rules, and the
//! flow that ties them to an [`AttendanceStore`](crate::store::AttendanceStore).

pub mod clock;
pub mod day_tracker;
pub mod error;
pub mod geofence;
pub mod service;
