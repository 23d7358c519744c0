//! Shipment ledger rows and their normalised, vehicle-bound form.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::vehicle::{VehicleBinding, VehicleRegistry};
use crate::api::{PointId, ShipmentId, VehicleId, UNKNOWN_TRANSPORTER};

/// Commercial arrangement under which a shipment was carried.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransporterType {
    Dedicated,
    Spot,
    Other(String),
}

impl TransporterType {
    /// Case-insensitive, whitespace-trimmed. A missing description is `Other("")`.
    pub fn parse(raw: Option<&str>) -> Self {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        if trimmed.eq_ignore_ascii_case("dedicated") {
            TransporterType::Dedicated
        } else if trimmed.eq_ignore_ascii_case("spot") {
            TransporterType::Spot
        } else {
            TransporterType::Other(trimmed.to_string())
        }
    }

    /// Only dedicated vehicles accrue a chargeable dead-head leg.
    pub fn accrues_dead_head(&self) -> bool {
        matches!(self, TransporterType::Dedicated)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransporterType::Dedicated => "dedicated",
            TransporterType::Spot => "spot",
            TransporterType::Other(s) => s,
        }
    }
}

impl From<String> for TransporterType {
    fn from(value: String) -> Self {
        TransporterType::parse(Some(&value))
    }
}

impl From<TransporterType> for String {
    fn from(value: TransporterType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for TransporterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw shipment ledger row as returned by the data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentLedgerRow {
    pub shipment_id: i64,
    #[serde(default)]
    pub transporter_name: Option<String>,
    #[serde(default)]
    pub transporter_type: Option<String>,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub origin_point: Option<String>,
    #[serde(default)]
    pub destination_point: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<i64>,
}

impl ShipmentLedgerRow {
    fn transporter_label(&self) -> String {
        self.transporter_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_TRANSPORTER)
            .to_string()
    }

    fn dedupe_key(&self) -> (NaiveDateTime, Option<i64>, Option<&str>, Option<&str>, Option<&str>) {
        (
            self.start_time,
            self.vehicle_id,
            self.origin_point.as_deref(),
            self.destination_point.as_deref(),
            self.transporter_name.as_deref(),
        )
    }
}

/// A ledger row bound to the vehicle registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub shipment_id: ShipmentId,
    pub binding: VehicleBinding,
    pub transporter_id: String,
    pub transporter_type: TransporterType,
    pub start_time: NaiveDateTime,
    pub origin_point_id: Option<PointId>,
    pub destination_point_id: Option<PointId>,
}

impl ShipmentRecord {
    pub fn from_ledger(row: &ShipmentLedgerRow, registry: &VehicleRegistry) -> Self {
        Self {
            shipment_id: ShipmentId::new(row.shipment_id),
            binding: registry.bind(row.vehicle_id.map(VehicleId::new), row.start_time),
            transporter_id: row.transporter_label(),
            transporter_type: TransporterType::parse(row.transporter_type.as_deref()),
            start_time: row.start_time,
            origin_point_id: PointId::parse(row.origin_point.as_deref()),
            destination_point_id: PointId::parse(row.destination_point.as_deref()),
        }
    }

    /// Vehicle id used for sequencing; `None` unless the binding succeeded.
    pub fn vehicle_id(&self) -> Option<VehicleId> {
        self.binding.vehicle_id()
    }

    pub fn plate_number(&self) -> Option<&str> {
        self.binding.plate_number()
    }

    pub fn segment(&self) -> Option<&str> {
        self.binding.segment()
    }

    /// Reporting date: calendar day of the stored local start time.
    pub fn shipment_date(&self) -> NaiveDate {
        self.start_time.date()
    }
}

/// Bind ledger rows to vehicles and collapse duplicate shipment ids.
///
/// For each `shipment_id` the row ordered first by
/// `(start_time, vehicle_id, origin, destination, transporter)` is kept; every
/// other row yields a `DuplicateShipment` diagnostic.
pub fn normalize_ledger(
    rows: &[ShipmentLedgerRow],
    registry: &VehicleRegistry,
) -> (Vec<ShipmentRecord>, Vec<Diagnostic>) {
    let mut ordered: Vec<&ShipmentLedgerRow> = rows.iter().collect();
    ordered.sort_by(|a, b| {
        a.shipment_id
            .cmp(&b.shipment_id)
            .then_with(|| a.dedupe_key().cmp(&b.dedupe_key()))
    });

    let mut seen = BTreeSet::new();
    let mut records = Vec::with_capacity(ordered.len());
    let mut diagnostics = Vec::new();

    for row in ordered {
        if seen.insert(row.shipment_id) {
            records.push(ShipmentRecord::from_ledger(row, registry));
        } else {
            diagnostics.push(Diagnostic::for_shipment(
                ShipmentId::new(row.shipment_id),
                row.vehicle_id.map(VehicleId::new),
                DiagnosticKind::DuplicateShipment,
            ));
        }
    }

    if !diagnostics.is_empty() {
        log::debug!(
            "Collapsed {} duplicate ledger rows into {} shipments",
            diagnostics.len(),
            records.len()
        );
    }

    (records, diagnostics)
}
