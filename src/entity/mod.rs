//! SeaORM entities.
//!
//! Kept apart from `models`: storage works with these and converts them into
//! business types before returning.

pub mod prelude;

pub mod activity_logs;
pub mod courses;
pub mod institutions;
pub mod students;
pub mod system_config;
pub mod teachers;
pub mod transfer_recipients;
pub mod transfers;
pub mod users;

use chrono::{DateTime, Utc};

/// Unix seconds to UTC, epoch on out-of-range input
pub(crate) fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}
