//! Data access for the dead-head dashboard.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Dashboard services / REST API                          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  db::services - thin async helpers over the traits      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  DatasetRepository + AttendanceRepository               │
//! └───────────┬───────────────────────────────┬─────────────┘
//!             │                               │
//!     ┌───────▼────────┐             ┌────────▼─────────┐
//!     │ LocalRepository│             │PostgresRepository│
//!     │  (in-memory)   │             │ (Diesel + r2d2)  │
//!     └────────────────┘             └──────────────────┘
//! ```
//!
//! Provider tables (shipment ledger, vehicles, route distances) are read-only.
//! The attendance log is the only table this service writes.
//!
//! ```ignore
//! use dha_rust::db::{services, RepositoryFactory};
//!
//! let repo = RepositoryFactory::from_env().await?;
//! let rows = services::load_dataset(repo.as_ref()).await?;
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use services::{
    get_attendance, health_check, list_attendance, load_dataset, upsert_attendance, DatasetRows,
};

pub use checksum::{calculate_checksum, dataset_version};
pub use repo_config::RepositoryConfig;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repositories::{LocalFixture, LocalRepository};
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AttendanceRepository, DatasetRepository, ErrorContext, FullRepository, RepositoryError,
    RepositoryResult,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

/// Process-wide repository, initialised once.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialise the global repository from `REPOSITORY_TYPE`, `DATABASE_URL`
/// and `LOCAL_FIXTURE_PATH`.
///
/// Must not be called from inside a tokio runtime; async callers should use
/// [`RepositoryFactory::from_env`] and pass the handle around.
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let runtime = Runtime::new().context("Failed to create async runtime for repository init")?;
    let repo = runtime
        .block_on(RepositoryFactory::from_env())
        .map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Global repository, initialising it on first use.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        init_repository()?;
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
