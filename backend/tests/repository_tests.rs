//! Local repository, factory and configuration behaviour.

mod support;

use std::io::Write;
use std::str::FromStr;

use chrono::Utc;
use dha_rust::db::{
    self, AttendanceRepository, DatasetRepository, LocalRepository, RepositoryBuilder,
    RepositoryConfig, RepositoryError, RepositoryFactory, RepositoryType,
};
use dha_rust::models::{AttendanceMonth, AttendanceRecord, DayFraction, DuplicateDistancePolicy};

#[tokio::test]
async fn test_sample_fixture_loads_all_tables() {
    let repo = support::sample_repository();
    assert!(repo.health_check().await.unwrap());
    assert_eq!(repo.fetch_shipment_ledger().await.unwrap().len(), 9);
    assert_eq!(repo.fetch_vehicles().await.unwrap().len(), 4);
    assert_eq!(repo.fetch_route_distances().await.unwrap().len(), 8);
}

#[tokio::test]
async fn test_unavailable_source_fails_every_fetch() {
    let repo = support::sample_repository();
    repo.set_available(false);

    assert!(matches!(
        repo.fetch_shipment_ledger().await,
        Err(RepositoryError::ConnectionError { .. })
    ));
    assert!(repo.fetch_vehicles().await.is_err());
    assert!(repo.fetch_route_distances().await.is_err());
    assert!(!repo.health_check().await.unwrap_or(false));
}

#[tokio::test]
async fn test_attendance_upsert_updates_in_place() {
    let repo = LocalRepository::new();
    let month = AttendanceMonth::from_str("2024-04").unwrap();
    let days = month.days_in_month();

    let first = AttendanceRecord::new(
        month,
        "QLB-101",
        Some("D-1".into()),
        vec![DayFraction::Full; days],
        Utc::now(),
    )
    .unwrap();
    repo.upsert_attendance(&first).await.unwrap();

    let second = AttendanceRecord::new(
        month,
        "QLB-101",
        None,
        vec![DayFraction::Half; days],
        Utc::now(),
    )
    .unwrap();
    repo.upsert_attendance(&second).await.unwrap();

    let stored = repo
        .get_attendance(month, "QLB-101")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_working_days, 15.0);
    assert_eq!(stored.driver_id, None);
    assert_eq!(repo.list_attendance(month).await.unwrap().len(), 1);

    let other_month = AttendanceMonth::from_str("2024-05").unwrap();
    assert!(repo.list_attendance(other_month).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_factory_builds_seeded_local_repository() {
    let repo = RepositoryBuilder::new()
        .repository_type(RepositoryType::Local)
        .fixture_path(support::sample_fixture_path())
        .build()
        .await
        .unwrap();
    let rows = db::load_dataset(repo.as_ref()).await.unwrap();
    assert_eq!(rows.shipments.len(), 9);
}

#[tokio::test]
async fn test_factory_rejects_malformed_fixture() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{\"shipments\": [{{\"shipment_id\": \"x\"}}]}}").unwrap();

    let result = RepositoryFactory::create(RepositoryType::Local, None, Some(file.path())).await;
    assert!(matches!(result, Err(RepositoryError::ValidationError { .. })));
}

#[tokio::test]
async fn test_config_file_selects_local_fixture() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[repository]
type = "local"

[local]
fixture_path = "{}"

[dashboard]
duplicate_distance_policy = "first_seen"
"#,
        support::sample_fixture_path().display()
    )
    .unwrap();

    let config = RepositoryConfig::from_file(file.path()).unwrap();
    assert_eq!(
        config.dashboard.duplicate_distance_policy,
        DuplicateDistancePolicy::FirstSeen
    );

    let repo = RepositoryFactory::from_repository_config(&config)
        .await
        .unwrap();
    assert_eq!(repo.fetch_vehicles().await.unwrap().len(), 4);
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/logistics")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_env_overrides_apply_to_config() {
    support::with_scoped_env(
        &[
            ("LOCAL_FIXTURE_PATH", Some("/tmp/other.json")),
            ("SNAPSHOT_TTL_SECS", Some("60")),
            ("JUMBO_SEGMENT", Some("Tanta")),
            ("JUMBO_TRANSPORTERS", Some("A Co, B Co")),
        ],
        || {
            let config = RepositoryConfig::from_toml_str("")
                .unwrap()
                .with_env_overrides()
                .unwrap();
            assert_eq!(
                config.local.fixture_path.as_deref(),
                Some(std::path::Path::new("/tmp/other.json"))
            );
            assert_eq!(config.dashboard.snapshot_ttl_secs, 60);
            assert_eq!(config.dashboard.jumbo.segment, "Tanta");
            assert!(config.dashboard.jumbo.transporters.contains("B Co"));
        },
    );
}

#[test]
fn test_invalid_ttl_override_is_rejected() {
    support::with_scoped_env(&[("SNAPSHOT_TTL_SECS", Some("soon"))], || {
        let result = RepositoryConfig::from_toml_str("")
            .unwrap()
            .with_env_overrides();
        assert!(matches!(
            result,
            Err(RepositoryError::ConfigurationError { .. })
        ));
    });
}

#[test]
fn test_global_repository_is_initialised_once() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("LOCAL_FIXTURE_PATH", None),
        ],
        || {
            let first = db::get_repository().unwrap();
            let second = db::get_repository().unwrap();
            assert!(std::sync::Arc::ptr_eq(first, second));
        },
    );
}
