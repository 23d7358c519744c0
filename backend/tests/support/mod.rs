#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use dha_rust::db::{LocalFixture, LocalRepository};
use dha_rust::models::{RouteDistanceRow, ShipmentLedgerRow, VehicleRow};

pub const WEFAQ: &str = "Alwefaq national transport";
pub const REHAB: &str = "Al -Rehab Office for Transport and";

/// Path of the bundled sample dataset.
pub fn sample_fixture_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample_dataset.json")
}

/// Local repository seeded with the bundled sample dataset.
pub fn sample_repository() -> LocalRepository {
    LocalRepository::from_fixture_file(sample_fixture_path()).expect("sample fixture loads")
}

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid test timestamp")
}

pub fn shipment(
    id: i64,
    vehicle: Option<i64>,
    transporter: &str,
    transporter_type: &str,
    start: NaiveDateTime,
    route: (&str, &str),
) -> ShipmentLedgerRow {
    ShipmentLedgerRow {
        shipment_id: id,
        transporter_name: Some(transporter.to_string()),
        transporter_type: Some(transporter_type.to_string()),
        start_time: start,
        origin_point: Some(route.0.to_string()),
        destination_point: Some(route.1.to_string()),
        vehicle_id: vehicle,
    }
}

pub fn vehicle(id: i64, plate: &str, segment: Option<&str>) -> VehicleRow {
    VehicleRow {
        vehicle_id: id,
        plate_number: plate.to_string(),
        segment: segment.map(str::to_string),
        valid_from: None,
        valid_to: None,
    }
}

pub fn fixture(
    shipments: Vec<ShipmentLedgerRow>,
    vehicles: Vec<VehicleRow>,
    distances: &[(&str, &str, f64)],
) -> LocalFixture {
    LocalFixture {
        shipments,
        vehicles,
        distances: distances
            .iter()
            .map(|(from, to, d)| RouteDistanceRow::new(from, to, *d))
            .collect(),
    }
}
