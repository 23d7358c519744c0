//! Per-request dashboard computations over a loaded snapshot.

use std::collections::{BTreeMap, BTreeSet};

use super::error::ServiceResult;
use super::filters::FilterSpec;
use super::reporting;
use super::snapshot::DatasetSnapshot;
use crate::api::ShipmentId;
use crate::config::DashboardConfig;
use crate::routes::dashboard::{DashboardData, FilterOptions};
use crate::routes::dataset::{DiagnosticsReport, ShipmentPage, MAX_PAGE_LIMIT};

/// Filter the resolved rows and build every chart of the dashboard.
pub fn compute_dashboard(
    snapshot: &DatasetSnapshot,
    filter: &FilterSpec,
    config: &DashboardConfig,
) -> ServiceResult<DashboardData> {
    let rows = filter.apply(&snapshot.resolution.shipments)?;

    let jumbo = reporting::jumbo_averages(&rows, &config.jumbo);
    let shipment_ids: BTreeSet<ShipmentId> = rows.iter().map(|r| r.shipment.shipment_id).collect();
    let diagnostic_count = snapshot
        .diagnostics
        .iter()
        .filter(|d| d.shipment_id.is_some_and(|id| shipment_ids.contains(&id)))
        .count();

    Ok(DashboardData {
        has_data: !rows.is_empty(),
        summary: reporting::summarize(&rows),
        daily: reporting::daily_distances(&rows),
        jumbo_available: !jumbo.is_empty(),
        jumbo_segment: config.jumbo.segment.clone(),
        jumbo,
        transporters: reporting::transporter_dead_head(&rows),
        diagnostic_count,
        dataset_version: snapshot.version.clone(),
    })
}

/// Distinct values present in the loaded dataset.
pub fn filter_options(snapshot: &DatasetSnapshot) -> FilterOptions {
    let mut transporters = BTreeSet::new();
    let mut transporter_types = BTreeSet::new();
    let mut origin_points = BTreeSet::new();
    let mut destination_points = BTreeSet::new();
    let mut segments = BTreeSet::new();

    for resolved in &snapshot.resolution.shipments {
        let record = &resolved.shipment;
        transporters.insert(record.transporter_id.clone());
        if !record.transporter_type.as_str().is_empty() {
            transporter_types.insert(record.transporter_type.as_str().to_string());
        }
        if let Some(origin) = &record.origin_point_id {
            origin_points.insert(origin.as_str().to_string());
        }
        if let Some(destination) = &record.destination_point_id {
            destination_points.insert(destination.as_str().to_string());
        }
        if let Some(segment) = record.segment() {
            segments.insert(segment.to_string());
        }
    }

    let dates = snapshot
        .resolution
        .shipments
        .iter()
        .map(|r| r.shipment.shipment_date());

    FilterOptions {
        transporters: transporters.into_iter().collect(),
        transporter_types: transporter_types.into_iter().collect(),
        origin_points: origin_points.into_iter().collect(),
        destination_points: destination_points.into_iter().collect(),
        segments: segments.into_iter().collect(),
        min_date: dates.clone().min(),
        max_date: dates.max(),
    }
}

/// Resolved rows matching `filter`, at most `limit` of them (capped at
/// [`MAX_PAGE_LIMIT`]).
pub fn shipment_page(
    snapshot: &DatasetSnapshot,
    filter: &FilterSpec,
    limit: usize,
) -> ServiceResult<ShipmentPage> {
    let rows = filter.apply(&snapshot.resolution.shipments)?;
    let limit = limit.clamp(1, MAX_PAGE_LIMIT);

    Ok(ShipmentPage {
        total: rows.len(),
        limit,
        rows: rows.into_iter().take(limit).cloned().collect(),
    })
}

pub fn diagnostics_report(snapshot: &DatasetSnapshot) -> DiagnosticsReport {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for diagnostic in &snapshot.diagnostics {
        *counts.entry(diagnostic.kind.code().to_string()).or_insert(0) += 1;
    }

    DiagnosticsReport {
        dataset_version: snapshot.version.clone(),
        total: snapshot.diagnostics.len(),
        counts,
        diagnostics: snapshot.diagnostics.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatasetRows;
    use crate::models::{DuplicateDistancePolicy, RouteDistanceRow, ShipmentLedgerRow, VehicleRow};
    use crate::services::filters::DateRange;
    use chrono::NaiveDate;

    const WEFAQ: &str = "Alwefaq national transport";

    fn ledger(id: i64, vehicle: i64, day: u32, hour: u32, route: (&str, &str)) -> ShipmentLedgerRow {
        ShipmentLedgerRow {
            shipment_id: id,
            transporter_name: Some(WEFAQ.into()),
            transporter_type: Some("Dedicated".into()),
            start_time: NaiveDate::from_ymd_opt(2024, 6, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            origin_point: Some(route.0.into()),
            destination_point: Some(route.1.into()),
            vehicle_id: Some(vehicle),
        }
    }

    fn snapshot() -> DatasetSnapshot {
        let rows = DatasetRows {
            shipments: vec![
                ledger(1, 1, 3, 8, ("A", "B")),
                ledger(2, 1, 3, 14, ("C", "D")),
                ledger(3, 1, 4, 9, ("D", "A")),
            ],
            vehicles: vec![VehicleRow {
                vehicle_id: 1,
                plate_number: "QLB-1".into(),
                segment: Some("Qalyub".into()),
                valid_from: None,
                valid_to: None,
            }],
            distances: vec![
                RouteDistanceRow::new("A", "B", 50.0),
                RouteDistanceRow::new("B", "C", 30.0),
                RouteDistanceRow::new("C", "D", 60.0),
            ],
        };
        DatasetSnapshot::build(&rows, DuplicateDistancePolicy::Min).unwrap()
    }

    #[test]
    fn test_dashboard_over_full_dataset() {
        let snapshot = snapshot();
        let data =
            compute_dashboard(&snapshot, &FilterSpec::default(), &DashboardConfig::default())
                .unwrap();

        assert!(data.has_data);
        assert_eq!(data.summary.shipments, 3);
        assert_eq!(data.summary.dead_head_distance.value(), 30.0);
        assert_eq!(data.daily.len(), 2);
        assert!(data.jumbo_available);
        assert_eq!(data.jumbo[0].average_daily_shipments, 1.5);
        // D->A is absent from the table: shipment 3 has a missing shipped leg.
        assert_eq!(data.diagnostic_count, 1);
    }

    #[test]
    fn test_empty_filter_result_is_not_an_error() {
        let snapshot = snapshot();
        let filter = FilterSpec {
            transporters: [String::from("Nobody")].into_iter().collect(),
            ..FilterSpec::default()
        };
        let data = compute_dashboard(&snapshot, &filter, &DashboardConfig::default()).unwrap();

        assert!(!data.has_data);
        assert!(!data.jumbo_available);
        assert!(data.daily.is_empty());
        assert_eq!(data.summary.dead_head_percentage, 0.0);
    }

    #[test]
    fn test_inverted_date_range_is_rejected() {
        let snapshot = snapshot();
        let filter = FilterSpec {
            date_range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            )),
            ..FilterSpec::default()
        };
        assert!(compute_dashboard(&snapshot, &filter, &DashboardConfig::default()).is_err());
        assert!(shipment_page(&snapshot, &filter, 10).is_err());
    }

    #[test]
    fn test_filter_options_cover_dataset() {
        let options = filter_options(&snapshot());
        assert_eq!(options.transporters, vec![WEFAQ.to_string()]);
        assert_eq!(options.transporter_types, vec!["dedicated".to_string()]);
        assert_eq!(options.origin_points, vec!["A", "C", "D"]);
        assert_eq!(options.segments, vec!["Qalyub"]);
        assert_eq!(options.min_date, NaiveDate::from_ymd_opt(2024, 6, 3));
        assert_eq!(options.max_date, NaiveDate::from_ymd_opt(2024, 6, 4));
    }

    #[test]
    fn test_shipment_page_truncates_and_counts() {
        let snapshot = snapshot();
        let page = shipment_page(&snapshot, &FilterSpec::default(), 2).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.rows.len(), 2);

        let capped = shipment_page(&snapshot, &FilterSpec::default(), 50_000).unwrap();
        assert_eq!(capped.limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_diagnostics_report_counts_by_code() {
        let report = diagnostics_report(&snapshot());
        assert_eq!(report.total, report.diagnostics.len());
        assert_eq!(report.counts.get("missing_distance"), Some(&1));
    }
}
