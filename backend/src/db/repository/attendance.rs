//! Persistence of the monthly vehicle attendance log.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{AttendanceMonth, AttendanceRecord};

/// Repository trait for attendance records keyed by `(month, plate_number)`.
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Insert the record, or replace the stored one with the same key.
    ///
    /// # Returns
    /// * `Ok(AttendanceRecord)` - The stored record
    /// * `Err(RepositoryError)` - If the write fails
    async fn upsert_attendance(&self, record: &AttendanceRecord)
        -> RepositoryResult<AttendanceRecord>;

    async fn get_attendance(
        &self,
        month: AttendanceMonth,
        plate_number: &str,
    ) -> RepositoryResult<Option<AttendanceRecord>>;

    /// All records of a month, sorted by plate number.
    async fn list_attendance(&self, month: AttendanceMonth)
        -> RepositoryResult<Vec<AttendanceRecord>>;
}
