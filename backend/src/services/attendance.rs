//! Monthly attendance log for rental (dedicated) vehicles.

use chrono::Utc;
use log::info;
use std::collections::{BTreeMap, BTreeSet};

use super::error::{ServiceError, ServiceResult};
use super::snapshot::DatasetSnapshot;
use crate::db::{services as db_services, AttendanceRepository};
use crate::models::{AttendanceMonth, AttendanceRecord, DayFraction};
use crate::routes::attendance::{AttendanceSheet, AttendanceSheetRow, AttendanceSubmission};

/// Validate a submission, derive its total and upsert it.
pub async fn submit<R: AttendanceRepository + ?Sized>(
    repo: &R,
    month: AttendanceMonth,
    plate_number: &str,
    submission: AttendanceSubmission,
) -> ServiceResult<AttendanceRecord> {
    let daily_log = submission
        .daily_log
        .iter()
        .enumerate()
        .map(|(day, value)| {
            DayFraction::try_from(*value)
                .map_err(|e| ServiceError::InvalidAttendance(format!("day {}: {}", day + 1, e)))
        })
        .collect::<ServiceResult<Vec<_>>>()?;

    let record = AttendanceRecord::new(
        month,
        plate_number,
        submission.driver_id,
        daily_log,
        Utc::now(),
    )
    .map_err(ServiceError::InvalidAttendance)?;

    let stored = db_services::upsert_attendance(repo, &record).await?;
    info!(
        "Stored attendance for {} in {}: {} working days",
        stored.plate_number, stored.month, stored.total_working_days
    );
    Ok(stored)
}

/// Plates of bound vehicles that carried at least one dedicated shipment.
pub fn rental_plates(snapshot: &DatasetSnapshot) -> BTreeSet<String> {
    snapshot
        .resolution
        .shipments
        .iter()
        .filter(|r| r.shipment.transporter_type.accrues_dead_head())
        .filter(|r| r.shipment.vehicle_id().is_some())
        .filter_map(|r| r.shipment.plate_number().map(str::to_string))
        .collect()
}

/// One row per plate in `plates` or with a stored record, sorted by plate.
/// Plates without a record get an all-absent log.
pub async fn sheet<R, I>(repo: &R, month: AttendanceMonth, plates: I) -> ServiceResult<AttendanceSheet>
where
    R: AttendanceRepository + ?Sized,
    I: IntoIterator<Item = String>,
{
    let stored = db_services::list_attendance(repo, month).await?;
    let days = month.days_in_month();

    let mut rows: BTreeMap<String, AttendanceSheetRow> = plates
        .into_iter()
        .map(|plate| plate.trim().to_string())
        .filter(|plate| !plate.is_empty())
        .map(|plate| {
            let row = AttendanceSheetRow {
                plate_number: plate.clone(),
                driver_id: None,
                daily_log: vec![DayFraction::Absent; days],
                total_working_days: 0.0,
                last_updated: None,
            };
            (plate, row)
        })
        .collect();

    for record in stored {
        rows.insert(
            record.plate_number.clone(),
            AttendanceSheetRow {
                plate_number: record.plate_number,
                driver_id: record.driver_id,
                daily_log: record.daily_log,
                total_working_days: record.total_working_days,
                last_updated: Some(record.last_updated),
            },
        );
    }

    Ok(AttendanceSheet {
        month,
        days_in_month: days,
        rows: rows.into_values().collect(),
    })
}
