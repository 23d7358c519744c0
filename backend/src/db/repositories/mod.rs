//! Repository implementations:
//! - `local`: in-memory tables, optionally seeded from a JSON fixture
//! - `postgres`: Diesel over the operational Postgres database
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::{LocalFixture, LocalRepository};
#[cfg(feature = "postgres-repo")]
pub use postgres::{PoolStats, PostgresConfig, PostgresRepository};
