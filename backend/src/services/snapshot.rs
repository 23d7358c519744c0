//! Immutable dataset snapshots and their time-bounded cache.
//!
//! A snapshot is built once per load: vehicle registry, ledger normalisation,
//! distance table and one resolver pass. Requests only filter and aggregate
//! the resolved rows.

use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::deadhead::{resolve, Resolution};
use super::error::{ServiceError, ServiceResult};
use crate::db::{dataset_version, services as db_services, DatasetRepository, DatasetRows};
use crate::models::{
    normalize_ledger, Diagnostic, DistanceTable, DuplicateDistancePolicy, VehicleRegistry,
};
use crate::routes::dataset::DatasetInfo;

/// One loaded and resolved dataset.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    /// SHA-256 over the raw provider rows.
    pub version: String,
    pub loaded_at: DateTime<Utc>,
    pub registry: VehicleRegistry,
    pub distances: DistanceTable,
    pub resolution: Resolution,
    /// Load-time findings followed by the resolver's.
    pub diagnostics: Vec<Diagnostic>,
}

impl DatasetSnapshot {
    pub fn build(rows: &DatasetRows, policy: DuplicateDistancePolicy) -> ServiceResult<Self> {
        let version = dataset_version(rows)?;

        let registry = VehicleRegistry::from_rows(&rows.vehicles);
        let (records, mut diagnostics) = normalize_ledger(&rows.shipments, &registry);
        let (distances, distance_diagnostics) = DistanceTable::from_rows(&rows.distances, policy);
        diagnostics.extend(distance_diagnostics);

        let resolution = resolve(&records, &distances);
        diagnostics.extend(resolution.diagnostics.iter().cloned());

        Ok(Self {
            version,
            loaded_at: Utc::now(),
            registry,
            distances,
            resolution,
            diagnostics,
        })
    }

    /// Fetch all provider tables and build a snapshot. A fetch failure is
    /// reported as [`ServiceError::DataSource`].
    pub async fn load<R: DatasetRepository + ?Sized>(
        repo: &R,
        policy: DuplicateDistancePolicy,
    ) -> ServiceResult<Self> {
        let rows = db_services::load_dataset(repo)
            .await
            .map_err(ServiceError::DataSource)?;
        let snapshot = Self::build(&rows, policy)?;
        info!(
            "Dataset snapshot {} built: {} shipments, {} vehicles, {} distance pairs, {} diagnostics",
            snapshot.short_version(),
            snapshot.resolution.shipments.len(),
            snapshot.registry.len(),
            snapshot.distances.len(),
            snapshot.diagnostics.len()
        );
        Ok(snapshot)
    }

    pub fn short_version(&self) -> &str {
        &self.version[..self.version.len().min(12)]
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            version: self.version.clone(),
            loaded_at: self.loaded_at,
            shipments: self.resolution.shipments.len(),
            vehicles: self.registry.len(),
            distance_pairs: self.distances.len(),
            diagnostics: self.diagnostics.len(),
            totals: self.resolution.totals.clone(),
        }
    }
}

struct CacheEntry {
    snapshot: Arc<DatasetSnapshot>,
    stored_at: Instant,
}

/// Holds at most one snapshot and reloads it once it is older than `ttl`.
pub struct SnapshotCache {
    ttl: Duration,
    policy: DuplicateDistancePolicy,
    entry: RwLock<Option<CacheEntry>>,
    load_lock: tokio::sync::Mutex<()>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration, policy: DuplicateDistancePolicy) -> Self {
        Self {
            ttl,
            policy,
            entry: RwLock::new(None),
            load_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached snapshot if it is still fresh.
    pub fn current(&self) -> Option<Arc<DatasetSnapshot>> {
        let guard = self.entry.read();
        guard
            .as_ref()
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    /// Fresh snapshot, loading one when the cache is empty or expired.
    pub async fn get_or_load<R: DatasetRepository + ?Sized>(
        &self,
        repo: &R,
    ) -> ServiceResult<Arc<DatasetSnapshot>> {
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }

        let _loading = self.load_lock.lock().await;
        // Another request may have finished loading while we waited.
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        debug!("Snapshot cache empty or expired, loading dataset");
        self.load_into_cache(repo).await
    }

    /// Drop the cached snapshot and load a new one.
    pub async fn refresh<R: DatasetRepository + ?Sized>(
        &self,
        repo: &R,
    ) -> ServiceResult<Arc<DatasetSnapshot>> {
        let _loading = self.load_lock.lock().await;
        self.invalidate();
        self.load_into_cache(repo).await
    }

    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }

    async fn load_into_cache<R: DatasetRepository + ?Sized>(
        &self,
        repo: &R,
    ) -> ServiceResult<Arc<DatasetSnapshot>> {
        match DatasetSnapshot::load(repo, self.policy).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.entry.write() = Some(CacheEntry {
                    snapshot: Arc::clone(&snapshot),
                    stored_at: Instant::now(),
                });
                Ok(snapshot)
            }
            Err(err) => {
                // Never serve a stale snapshot after a failed load.
                self.invalidate();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::models::{RouteDistanceRow, ShipmentLedgerRow, VehicleRow};
    use chrono::NaiveDate;

    fn seeded_repo() -> LocalRepository {
        let repo = LocalRepository::new();
        repo.insert_vehicles([VehicleRow {
            vehicle_id: 1,
            plate_number: "QLB-1".into(),
            segment: Some("Qalyub".into()),
            valid_from: None,
            valid_to: None,
        }]);
        let start = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        repo.insert_shipments([ShipmentLedgerRow {
            shipment_id: 10,
            transporter_name: Some("Alwefaq national transport".into()),
            transporter_type: Some("Dedicated".into()),
            start_time: start,
            origin_point: Some("A".into()),
            destination_point: Some("B".into()),
            vehicle_id: Some(1),
        }]);
        repo.insert_distances([
            RouteDistanceRow::new("A", "B", 50.0),
            RouteDistanceRow::new("A", "B", 55.0),
        ]);
        repo
    }

    #[tokio::test]
    async fn test_snapshot_merges_load_and_resolution_diagnostics() {
        let repo = seeded_repo();
        let snapshot = DatasetSnapshot::load(&repo, DuplicateDistancePolicy::Min)
            .await
            .unwrap();

        assert_eq!(snapshot.resolution.shipments.len(), 1);
        assert_eq!(
            snapshot.resolution.shipments[0].shipped_distance.value(),
            50.0
        );
        assert!(snapshot
            .diagnostics
            .iter()
            .any(|d| d.kind.code() == "duplicate_distance"));
        assert_eq!(snapshot.version.len(), 64);
    }

    #[tokio::test]
    async fn test_version_tracks_row_content() {
        let repo = seeded_repo();
        let first = DatasetSnapshot::load(&repo, DuplicateDistancePolicy::Min)
            .await
            .unwrap();
        let again = DatasetSnapshot::load(&repo, DuplicateDistancePolicy::Min)
            .await
            .unwrap();
        assert_eq!(first.version, again.version);

        repo.insert_distances([RouteDistanceRow::new("B", "A", 50.0)]);
        let changed = DatasetSnapshot::load(&repo, DuplicateDistancePolicy::Min)
            .await
            .unwrap();
        assert_ne!(first.version, changed.version);
    }

    #[tokio::test]
    async fn test_cache_reuses_fresh_snapshot() {
        let repo = seeded_repo();
        let cache = SnapshotCache::new(Duration::from_secs(3600), DuplicateDistancePolicy::Min);

        let first = cache.get_or_load(&repo).await.unwrap();
        let second = cache.get_or_load(&repo).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_zero_ttl_always_reloads() {
        let repo = seeded_repo();
        let cache = SnapshotCache::new(Duration::ZERO, DuplicateDistancePolicy::Min);

        let first = cache.get_or_load(&repo).await.unwrap();
        let second = cache.get_or_load(&repo).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(cache.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_cache() {
        let repo = seeded_repo();
        let cache = SnapshotCache::new(Duration::from_secs(3600), DuplicateDistancePolicy::Min);
        cache.get_or_load(&repo).await.unwrap();

        repo.set_available(false);
        let err = cache.refresh(&repo).await.unwrap_err();
        assert!(err.is_data_source());
        assert!(cache.current().is_none());

        repo.set_available(true);
        assert!(cache.get_or_load(&repo).await.is_ok());
    }
}
