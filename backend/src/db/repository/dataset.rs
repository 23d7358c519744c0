//! Read-only access to the provider data the resolver consumes.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{RouteDistanceRow, ShipmentLedgerRow, VehicleRow};

/// Repository trait for the shipment, vehicle and route-distance tables.
///
/// Implementations return raw rows; deduplication and validation happen in
/// the snapshot builder so every backend behaves identically.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Check that the data source is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Fetch one row per shipment utilization record.
    ///
    /// # Returns
    /// * `Ok(Vec<ShipmentLedgerRow>)` - Raw ledger rows, possibly with duplicates
    /// * `Err(RepositoryError)` - If the source cannot be read
    async fn fetch_shipment_ledger(&self) -> RepositoryResult<Vec<ShipmentLedgerRow>>;

    /// Fetch vehicle reference rows with their segment assignments.
    async fn fetch_vehicles(&self) -> RepositoryResult<Vec<VehicleRow>>;

    /// Fetch the point-pair distance table.
    async fn fetch_route_distances(&self) -> RepositoryResult<Vec<RouteDistanceRow>>;
}
