//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::db::repository::FullRepository;
use crate::services::SnapshotCache;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Resolved dataset, reloaded after the configured TTL
    pub snapshots: Arc<SnapshotCache>,
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>, config: DashboardConfig) -> Self {
        let snapshots = SnapshotCache::new(config.snapshot_ttl(), config.duplicate_distance_policy);
        Self {
            repository,
            snapshots: Arc::new(snapshots),
            config: Arc::new(config),
        }
    }
}
