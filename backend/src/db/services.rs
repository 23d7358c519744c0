//! Backend-agnostic helpers over the repository traits.

use log::debug;
use serde::{Deserialize, Serialize};

use super::repository::{
    AttendanceRepository, DatasetRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    AttendanceMonth, AttendanceRecord, RouteDistanceRow, ShipmentLedgerRow, VehicleRow,
};

/// The three provider tables as fetched, before any normalisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetRows {
    pub shipments: Vec<ShipmentLedgerRow>,
    pub vehicles: Vec<VehicleRow>,
    pub distances: Vec<RouteDistanceRow>,
}

pub async fn health_check<R: DatasetRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Fetch ledger, vehicles and distances concurrently. Any failure fails the
/// whole load.
pub async fn load_dataset<R: DatasetRepository + ?Sized>(repo: &R) -> RepositoryResult<DatasetRows> {
    let (shipments, vehicles, distances) = tokio::try_join!(
        repo.fetch_shipment_ledger(),
        repo.fetch_vehicles(),
        repo.fetch_route_distances(),
    )
    .map_err(|e| e.with_operation("load_dataset"))?;

    debug!(
        "Loaded dataset rows: {} shipments, {} vehicles, {} distances",
        shipments.len(),
        vehicles.len(),
        distances.len()
    );

    Ok(DatasetRows {
        shipments,
        vehicles,
        distances,
    })
}

/// Store an attendance record. The record must already be validated.
pub async fn upsert_attendance<R: AttendanceRepository + ?Sized>(
    repo: &R,
    record: &AttendanceRecord,
) -> RepositoryResult<AttendanceRecord> {
    if record.plate_number.trim().is_empty() {
        return Err(RepositoryError::validation(
            "Attendance record requires a plate number",
        ));
    }
    repo.upsert_attendance(record).await
}

pub async fn get_attendance<R: AttendanceRepository + ?Sized>(
    repo: &R,
    month: AttendanceMonth,
    plate_number: &str,
) -> RepositoryResult<Option<AttendanceRecord>> {
    repo.get_attendance(month, plate_number).await
}

pub async fn list_attendance<R: AttendanceRepository + ?Sized>(
    repo: &R,
    month: AttendanceMonth,
) -> RepositoryResult<Vec<AttendanceRecord>> {
    repo.list_attendance(month).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::models::{DayFraction, VehicleRow};
    use chrono::Utc;

    #[tokio::test]
    async fn test_load_dataset_collects_all_tables() {
        let repo = LocalRepository::new();
        repo.insert_vehicles([VehicleRow {
            vehicle_id: 7,
            plate_number: "ABC-123".into(),
            segment: None,
            valid_from: None,
            valid_to: None,
        }]);
        repo.insert_distances([RouteDistanceRow::new("A", "B", 50.0)]);

        let rows = load_dataset(&repo).await.unwrap();
        assert!(rows.shipments.is_empty());
        assert_eq!(rows.vehicles.len(), 1);
        assert_eq!(rows.distances.len(), 1);
    }

    #[tokio::test]
    async fn test_load_dataset_fails_when_source_unavailable() {
        let repo = LocalRepository::new();
        repo.set_available(false);

        let err = load_dataset(&repo).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
        assert_eq!(err.context().operation.as_deref(), Some("load_dataset"));
    }

    #[tokio::test]
    async fn test_upsert_rejects_blank_plate() {
        let repo = LocalRepository::new();
        let month = AttendanceMonth::new(2024, 2).unwrap();
        let record = AttendanceRecord {
            month,
            plate_number: "  ".into(),
            driver_id: None,
            daily_log: vec![DayFraction::Absent; month.days_in_month()],
            total_working_days: 0.0,
            last_updated: Utc::now(),
        };
        assert!(upsert_attendance(&repo, &record).await.is_err());
        assert_eq!(repo.attendance_count(), 0);
    }
}
