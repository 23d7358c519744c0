//! Postgres repository implementation using Diesel.
//!
//! The provider tables (`truck_utilization`, `route_info`,
//! `shipping_receiving_points_info`, `transporter_info`,
//! `transporter_type_info`, `vehicle_info`, `vehicle_assignment`,
//! `segment_info`) are read with raw SQL; duplicates they contain are settled
//! later by the snapshot builder. The only table this service writes is
//! `vehicle_attendance`, created by the embedded migrations.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    AttendanceRepository, DatasetRepository, ErrorContext, RepositoryError, RepositoryResult,
};
use crate::models::{
    AttendanceMonth, AttendanceRecord, RouteDistanceRow, ShipmentLedgerRow, VehicleRow,
};

mod models;
mod schema;

use models::*;
use schema::vehicle_attendance;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

const SHIPMENT_LEDGER_SQL: &str = r#"
    SELECT DISTINCT
        tu.shipment::bigint           AS shipment,
        ti.transporter_name           AS transporter_name,
        tti.transporter_type_description AS transporter_type_description,
        tu.actual_shipment_start::timestamp AS actual_shipment_start,
        srpi.name                     AS shipping_point,
        srpi2.name                    AS receiving_point,
        tu.vehicle_id::bigint         AS vehicle_id
    FROM truck_utilization tu
    LEFT JOIN route_info ri ON tu.route_id = ri.id
    LEFT JOIN shipping_receiving_points_info srpi ON ri.shipping_point_id = srpi.id
    LEFT JOIN shipping_receiving_points_info srpi2 ON ri.receiving_point_id = srpi2.id
    LEFT JOIN transporter_info ti ON ti.id = tu.transporter_code_id
    LEFT JOIN transporter_type_info tti ON tti.id = ti.transporter_type_id
    WHERE tu.actual_shipment_start IS NOT NULL
"#;

const VEHICLES_SQL: &str = r#"
    SELECT
        vi.id::bigint                 AS id,
        vi.plate_number_assigned      AS plate_number_assigned,
        si.description                AS segment,
        va.period_start::timestamp    AS valid_from,
        va.period_end::timestamp      AS valid_to
    FROM vehicle_info vi
    LEFT JOIN vehicle_assignment va ON va.vehicle_plate_number = vi.plate_number_assigned
    LEFT JOIN segment_info si ON si.id = va.segment_id
    WHERE vi.plate_number_assigned IS NOT NULL
"#;

const ROUTE_DISTANCES_SQL: &str = r#"
    SELECT
        srpi.name                     AS shipping_point,
        srpi2.name                    AS receiving_point,
        ri.distance::float8           AS distance
    FROM route_info ri
    LEFT JOIN shipping_receiving_points_info srpi ON ri.shipping_point_id = srpi.id
    LEFT JOIN shipping_receiving_points_info srpi2 ON ri.receiving_point_id = srpi2.id
"#;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connection_timeout_sec: u64,
    pub idle_timeout_sec: u64,
    /// Retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay; doubles with each attempt
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from the environment variables listed in the
    /// module docs.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub max_size: u32,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

#[derive(Debug, Default)]
struct QueryCounters {
    total: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    counters: Arc<QueryCounters>,
}

impl PostgresRepository {
    /// Create the pool and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        log::info!(
            "Postgres repository ready (pool max={}, retries={})",
            config.max_pool_size,
            config.max_retries
        );

        Ok(Self {
            pool,
            config,
            counters: Arc::new(QueryCounters::default()),
        })
    }

    /// Run `f` on a pooled connection in a blocking task, retrying retryable
    /// failures with exponential backoff.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: Fn(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);
        let counters = self.counters.clone();

        task::spawn_blocking(move || {
            let mut attempt = 0;
            loop {
                let result = pool
                    .get()
                    .map_err(RepositoryError::from)
                    .and_then(|mut conn| {
                        counters.total.fetch_add(1, Ordering::Relaxed);
                        f(&mut conn)
                    });

                match result {
                    Ok(value) => return Ok(value),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        attempt += 1;
                        counters.retried.fetch_add(1, Ordering::Relaxed);
                        log::debug!(
                            "{} failed (attempt {}), retrying in {:?}: {}",
                            operation,
                            attempt,
                            delay,
                            e
                        );
                        std::thread::sleep(delay);
                        delay *= 2;
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                }
            }
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new(operation),
            )
        })?
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            max_size: self.config.max_pool_size,
            total_queries: self.counters.total.load(Ordering::Relaxed),
            failed_queries: self.counters.failed.load(Ordering::Relaxed),
            retried_operations: self.counters.retried.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl DatasetRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn fetch_shipment_ledger(&self) -> RepositoryResult<Vec<ShipmentLedgerRow>> {
        let rows = self
            .with_conn("fetch_shipment_ledger", |conn| {
                sql_query(SHIPMENT_LEDGER_SQL)
                    .load::<LedgerQueryRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        log::debug!("Fetched {} shipment ledger rows", rows.len());
        Ok(rows.into_iter().map(ShipmentLedgerRow::from).collect())
    }

    async fn fetch_vehicles(&self) -> RepositoryResult<Vec<VehicleRow>> {
        let rows = self
            .with_conn("fetch_vehicles", |conn| {
                sql_query(VEHICLES_SQL)
                    .load::<VehicleQueryRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        log::debug!("Fetched {} vehicle rows", rows.len());
        Ok(rows.into_iter().map(VehicleRow::from).collect())
    }

    async fn fetch_route_distances(&self) -> RepositoryResult<Vec<RouteDistanceRow>> {
        let rows = self
            .with_conn("fetch_route_distances", |conn| {
                sql_query(ROUTE_DISTANCES_SQL)
                    .load::<DistanceQueryRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        log::debug!("Fetched {} route distance rows", rows.len());
        Ok(rows.into_iter().map(RouteDistanceRow::from).collect())
    }
}

#[async_trait]
impl AttendanceRepository for PostgresRepository {
    async fn upsert_attendance(
        &self,
        record: &AttendanceRecord,
    ) -> RepositoryResult<AttendanceRecord> {
        let row = AttendanceRow::from_record(record)?;
        let stored = self
            .with_conn("upsert_attendance", move |conn| {
                diesel::insert_into(vehicle_attendance::table)
                    .values(&row)
                    .on_conflict((
                        vehicle_attendance::month,
                        vehicle_attendance::vehicle_plate_number,
                    ))
                    .do_update()
                    .set((
                        vehicle_attendance::driver_id.eq(excluded(vehicle_attendance::driver_id)),
                        vehicle_attendance::daily_log.eq(excluded(vehicle_attendance::daily_log)),
                        vehicle_attendance::total_working_days
                            .eq(excluded(vehicle_attendance::total_working_days)),
                        vehicle_attendance::last_updated
                            .eq(excluded(vehicle_attendance::last_updated)),
                    ))
                    .returning(AttendanceRow::as_returning())
                    .get_result::<AttendanceRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        stored.into_record()
    }

    async fn get_attendance(
        &self,
        month: AttendanceMonth,
        plate_number: &str,
    ) -> RepositoryResult<Option<AttendanceRecord>> {
        let month_key = month.to_string();
        let plate = plate_number.to_string();
        let row = self
            .with_conn("get_attendance", move |conn| {
                vehicle_attendance::table
                    .filter(vehicle_attendance::month.eq(&month_key))
                    .filter(vehicle_attendance::vehicle_plate_number.eq(&plate))
                    .select(AttendanceRow::as_select())
                    .first::<AttendanceRow>(conn)
                    .optional()
                    .map_err(RepositoryError::from)
            })
            .await?;
        row.map(AttendanceRow::into_record).transpose()
    }

    async fn list_attendance(
        &self,
        month: AttendanceMonth,
    ) -> RepositoryResult<Vec<AttendanceRecord>> {
        let month_key = month.to_string();
        let rows = self
            .with_conn("list_attendance", move |conn| {
                vehicle_attendance::table
                    .filter(vehicle_attendance::month.eq(&month_key))
                    .order(vehicle_attendance::vehicle_plate_number.asc())
                    .select(AttendanceRow::as_select())
                    .load::<AttendanceRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        rows.into_iter().map(AttendanceRow::into_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_with_url_keeps_defaults() {
        let config = PostgresConfig::with_url("postgres://localhost/dha");
        assert_eq!(config.database_url, "postgres://localhost/dha");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_provider_queries_select_expected_columns() {
        for column in ["shipment", "actual_shipment_start", "shipping_point", "vehicle_id"] {
            assert!(SHIPMENT_LEDGER_SQL.contains(column));
        }
        assert!(VEHICLES_SQL.contains("valid_from"));
        assert!(ROUTE_DISTANCES_SQL.contains("distance"));
    }
}
