//! Aggregations over resolved shipments.
//!
//! All functions take the already filtered rows and are pure. Sums are
//! computed on raw kilometre values and wrapped back into [`Distance`] at the
//! end.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::deadhead::ResolvedShipment;
use crate::api::{km, VehicleId};
use crate::config::JumboConfig;
use crate::routes::dashboard::{
    DailyDistancePoint, DashboardSummary, JumboAverage, TransporterDeadHead,
};

/// `100 * dead_head / total`, clamped to `[0, 100]`. Zero or non-finite
/// denominators give `0`.
pub fn dead_head_percentage(dead_head: f64, total: f64) -> f64 {
    if !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    let pct = 100.0 * dead_head / total;
    if pct.is_finite() {
        pct.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[derive(Default)]
struct Sums {
    shipments: usize,
    dead_head: f64,
    total: f64,
}

impl Sums {
    fn add(&mut self, row: &ResolvedShipment) {
        self.shipments += 1;
        self.dead_head += row.dead_head_distance.value();
        self.total += row.total_distance.value();
    }
}

/// Per-date sums, ascending by date.
pub fn daily_distances(rows: &[&ResolvedShipment]) -> Vec<DailyDistancePoint> {
    let mut by_date: BTreeMap<NaiveDate, Sums> = BTreeMap::new();
    for row in rows {
        by_date
            .entry(row.shipment.shipment_date())
            .or_default()
            .add(row);
    }

    by_date
        .into_iter()
        .map(|(date, sums)| DailyDistancePoint {
            date,
            shipments: sums.shipments,
            dead_head_distance: km(sums.dead_head),
            total_distance: km(sums.total),
        })
        .collect()
}

/// Average shipments per active day for each bound vehicle in the jumbo subset.
///
/// Days on which a vehicle did not ship are not counted as zeros. Sorted by
/// plate number.
pub fn jumbo_averages(rows: &[&ResolvedShipment], jumbo: &JumboConfig) -> Vec<JumboAverage> {
    let mut per_vehicle: BTreeMap<VehicleId, (String, BTreeMap<NaiveDate, usize>)> =
        BTreeMap::new();

    for row in rows {
        let record = &row.shipment;
        if !jumbo.includes(record.segment(), &record.transporter_id) {
            continue;
        }
        let Some(vehicle_id) = record.vehicle_id() else {
            continue;
        };
        let plate = record
            .plate_number()
            .map(str::to_string)
            .unwrap_or_else(|| vehicle_id.to_string());
        let entry = per_vehicle
            .entry(vehicle_id)
            .or_insert_with(|| (plate, BTreeMap::new()));
        *entry.1.entry(record.shipment_date()).or_insert(0) += 1;
    }

    let mut averages: Vec<JumboAverage> = per_vehicle
        .into_iter()
        .map(|(vehicle_id, (plate_number, days))| {
            let shipments: usize = days.values().sum();
            let active_days = days.len();
            JumboAverage {
                vehicle_id,
                plate_number,
                shipments,
                active_days,
                average_daily_shipments: shipments as f64 / active_days as f64,
            }
        })
        .collect();

    averages.sort_by(|a, b| {
        a.plate_number
            .cmp(&b.plate_number)
            .then(a.vehicle_id.cmp(&b.vehicle_id))
    });
    averages
}

/// Dead-head share per transporter, sorted by transporter name.
pub fn transporter_dead_head(rows: &[&ResolvedShipment]) -> Vec<TransporterDeadHead> {
    let mut by_transporter: BTreeMap<&str, Sums> = BTreeMap::new();
    for row in rows {
        by_transporter
            .entry(row.shipment.transporter_id.as_str())
            .or_default()
            .add(row);
    }

    by_transporter
        .into_iter()
        .map(|(transporter, sums)| TransporterDeadHead {
            transporter: transporter.to_string(),
            shipments: sums.shipments,
            dead_head_distance: km(sums.dead_head),
            total_distance: km(sums.total),
            dead_head_percentage: dead_head_percentage(sums.dead_head, sums.total),
        })
        .collect()
}

pub fn summarize(rows: &[&ResolvedShipment]) -> DashboardSummary {
    let shipped: f64 = rows.iter().map(|r| r.shipped_distance.value()).sum();
    let dead_head: f64 = rows.iter().map(|r| r.dead_head_distance.value()).sum();
    let total: f64 = rows.iter().map(|r| r.total_distance.value()).sum();
    let vehicles: BTreeSet<VehicleId> = rows
        .iter()
        .filter_map(|r| r.shipment.vehicle_id())
        .collect();

    DashboardSummary {
        shipments: rows.len(),
        vehicles: vehicles.len(),
        shipped_distance: km(shipped),
        dead_head_distance: km(dead_head),
        total_distance: km(total),
        dead_head_percentage: dead_head_percentage(dead_head, total),
    }
}
