//! In-memory repository for tests and local development.
//!
//! Provider rows are seeded programmatically or from a JSON fixture file:
//!
//! ```json
//! {
//!   "shipments": [{"shipment_id": 1, "start_time": "2024-05-01T08:00:00", ...}],
//!   "vehicles":  [{"vehicle_id": 7, "plate_number": "ABC 123", "segment": "Qalyub"}],
//!   "distances": [{"origin_point": "A", "destination_point": "B", "distance": 50.0}]
//! }
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::db::repository::{
    AttendanceRepository, DatasetRepository, ErrorContext, RepositoryError, RepositoryResult,
};
use crate::models::{
    AttendanceMonth, AttendanceRecord, RouteDistanceRow, ShipmentLedgerRow, VehicleRow,
};

/// Provider tables in fixture form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalFixture {
    #[serde(default)]
    pub shipments: Vec<ShipmentLedgerRow>,
    #[serde(default)]
    pub vehicles: Vec<VehicleRow>,
    #[serde(default)]
    pub distances: Vec<RouteDistanceRow>,
}

#[derive(Debug, Default)]
struct LocalData {
    tables: LocalFixture,
    attendance: BTreeMap<(AttendanceMonth, String), AttendanceRecord>,
}

/// In-memory repository. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    available: Arc<AtomicBool>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::from_fixture(LocalFixture::default())
    }

    pub fn from_fixture(fixture: LocalFixture) -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                tables: fixture,
                attendance: BTreeMap::new(),
            })),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Load provider tables from a JSON fixture file.
    pub fn from_fixture_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let context = || {
            ErrorContext::new("load_fixture")
                .with_entity("fixture")
                .with_entity_id(path.display())
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration_with_context(
                format!("Failed to read fixture: {}", e),
                context(),
            )
        })?;
        let fixture: LocalFixture = serde_json::from_str(&content).map_err(|e| {
            RepositoryError::validation_with_context(
                format!("Failed to parse fixture: {}", e),
                context(),
            )
        })?;

        log::info!(
            "Loaded local fixture {} ({} shipments, {} vehicles, {} distances)",
            path.display(),
            fixture.shipments.len(),
            fixture.vehicles.len(),
            fixture.distances.len()
        );
        Ok(Self::from_fixture(fixture))
    }

    pub fn insert_shipments(&self, rows: impl IntoIterator<Item = ShipmentLedgerRow>) {
        self.data.write().tables.shipments.extend(rows);
    }

    pub fn insert_vehicles(&self, rows: impl IntoIterator<Item = VehicleRow>) {
        self.data.write().tables.vehicles.extend(rows);
    }

    pub fn insert_distances(&self, rows: impl IntoIterator<Item = RouteDistanceRow>) {
        self.data.write().tables.distances.extend(rows);
    }

    /// Replace the provider tables, keeping attendance records.
    pub fn replace_tables(&self, fixture: LocalFixture) {
        self.data.write().tables = fixture;
    }

    /// Simulate the data source going down (`false`) or coming back (`true`).
    /// Only the provider tables are affected.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn attendance_count(&self) -> usize {
        self.data.read().attendance.len()
    }

    fn ensure_available(&self, operation: &str) -> RepositoryResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(RepositoryError::connection_with_context(
                "Local data source is unavailable",
                ErrorContext::new(operation),
            ))
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasetRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.is_available())
    }

    async fn fetch_shipment_ledger(&self) -> RepositoryResult<Vec<ShipmentLedgerRow>> {
        self.ensure_available("fetch_shipment_ledger")?;
        Ok(self.data.read().tables.shipments.clone())
    }

    async fn fetch_vehicles(&self) -> RepositoryResult<Vec<VehicleRow>> {
        self.ensure_available("fetch_vehicles")?;
        Ok(self.data.read().tables.vehicles.clone())
    }

    async fn fetch_route_distances(&self) -> RepositoryResult<Vec<RouteDistanceRow>> {
        self.ensure_available("fetch_route_distances")?;
        Ok(self.data.read().tables.distances.clone())
    }
}

#[async_trait]
impl AttendanceRepository for LocalRepository {
    async fn upsert_attendance(
        &self,
        record: &AttendanceRecord,
    ) -> RepositoryResult<AttendanceRecord> {
        let key = (record.month, record.plate_number.clone());
        self.data.write().attendance.insert(key, record.clone());
        Ok(record.clone())
    }

    async fn get_attendance(
        &self,
        month: AttendanceMonth,
        plate_number: &str,
    ) -> RepositoryResult<Option<AttendanceRecord>> {
        Ok(self
            .data
            .read()
            .attendance
            .get(&(month, plate_number.to_string()))
            .cloned())
    }

    async fn list_attendance(
        &self,
        month: AttendanceMonth,
    ) -> RepositoryResult<Vec<AttendanceRecord>> {
        Ok(self
            .data
            .read()
            .attendance
            .iter()
            .filter(|((m, _), _)| *m == month)
            .map(|(_, record)| record.clone())
            .collect())
    }
}
