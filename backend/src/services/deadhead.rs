//! Dead-head resolver.
//!
//! For every dedicated shipment with a bound vehicle, the empty leg runs from
//! the shipment's drop-off point to the pickup point of the same vehicle's next
//! shipment. Records are grouped per vehicle, each group is sorted by
//! `(start_time, shipment_id)`, and each record is paired with its successor
//! inside that group only.
//!
//! Nothing here fails: an unknown point, a pair missing from the distance
//! table or an unbound vehicle zeroes the affected leg and leaves a
//! [`Diagnostic`] in the [`Resolution`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::api::{km, Distance, PointId, ShipmentId, VehicleId};
use crate::models::{Diagnostic, DiagnosticKind, DistanceTable, Leg, ShipmentRecord};

/// Shipment record with its resolved legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedShipment {
    #[serde(flatten)]
    pub shipment: ShipmentRecord,
    /// Pickup point of the vehicle's next shipment, when one exists.
    pub next_origin_point_id: Option<PointId>,
    pub shipped_distance: Distance,
    pub dead_head_distance: Distance,
    pub total_distance: Distance,
}

impl ResolvedShipment {
    fn new(
        shipment: ShipmentRecord,
        next_origin_point_id: Option<PointId>,
        shipped: f64,
        dead_head: f64,
    ) -> Self {
        Self {
            shipment,
            next_origin_point_id,
            shipped_distance: km(shipped),
            dead_head_distance: km(dead_head),
            total_distance: km(shipped + dead_head),
        }
    }
}

/// Aggregate figures over one resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionTotals {
    pub shipments: usize,
    pub shipped_distance: Distance,
    pub dead_head_distance: Distance,
    pub total_distance: Distance,
    pub missing_distances: usize,
    pub unresolved_vehicles: usize,
}

impl Default for ResolutionTotals {
    fn default() -> Self {
        Self {
            shipments: 0,
            shipped_distance: km(0.0),
            dead_head_distance: km(0.0),
            total_distance: km(0.0),
            missing_distances: 0,
            unresolved_vehicles: 0,
        }
    }
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Ordered by `(vehicle_id, start_time, shipment_id)`, unbound records first.
    pub shipments: Vec<ResolvedShipment>,
    pub diagnostics: Vec<Diagnostic>,
    pub totals: ResolutionTotals,
}

type OrderKey<'a> = (
    Option<VehicleId>,
    chrono::NaiveDateTime,
    ShipmentId,
    Option<&'a PointId>,
    Option<&'a PointId>,
    &'a str,
);

fn order_key(record: &ShipmentRecord) -> OrderKey<'_> {
    (
        record.vehicle_id(),
        record.start_time,
        record.shipment_id,
        record.origin_point_id.as_ref(),
        record.destination_point_id.as_ref(),
        record.transporter_id.as_str(),
    )
}

/// Pair every entry of an already sorted partition with the entry after it.
fn successor_pairs(partition: &[usize]) -> impl Iterator<Item = (usize, Option<usize>)> + '_ {
    partition
        .iter()
        .enumerate()
        .map(move |(i, &current)| (current, partition.get(i + 1).copied()))
}

/// Where a record stands with respect to the dead-head leg.
enum Successor {
    /// Not a dedicated shipment with a bound vehicle.
    Ineligible,
    /// Last shipment in its vehicle's history.
    Last,
    Next(usize),
}

struct LegResolver<'a> {
    distances: &'a DistanceTable,
    diagnostics: Vec<Diagnostic>,
    missing_distances: usize,
    unresolved_vehicles: usize,
}

impl<'a> LegResolver<'a> {
    fn flag(&mut self, record: &ShipmentRecord, kind: DiagnosticKind) {
        match kind {
            DiagnosticKind::UnresolvedVehicle { .. } => self.unresolved_vehicles += 1,
            _ => self.missing_distances += 1,
        }
        self.diagnostics.push(Diagnostic::for_shipment(
            record.shipment_id,
            record.binding.raw_vehicle_id(),
            kind,
        ));
    }

    fn lookup(
        &mut self,
        record: &ShipmentRecord,
        leg: Leg,
        from: Option<&PointId>,
        to: Option<&PointId>,
    ) -> f64 {
        match (from, to) {
            (Some(from), Some(to)) => match self.distances.get(from, to) {
                Some(distance) => distance.value(),
                None => {
                    self.flag(
                        record,
                        DiagnosticKind::MissingDistance {
                            leg,
                            from: from.clone(),
                            to: to.clone(),
                        },
                    );
                    0.0
                }
            },
            _ => {
                self.flag(record, DiagnosticKind::MissingPoint { leg });
                0.0
            }
        }
    }

    fn shipped(&mut self, record: &ShipmentRecord) -> f64 {
        self.lookup(
            record,
            Leg::Shipped,
            record.origin_point_id.as_ref(),
            record.destination_point_id.as_ref(),
        )
    }

    fn dead_head(&mut self, record: &ShipmentRecord, next_origin: Option<&PointId>) -> f64 {
        match (record.destination_point_id.as_ref(), next_origin) {
            // Self-loop: zero by definition, whatever the table says.
            (Some(drop_off), Some(pickup)) if drop_off == pickup => 0.0,
            (drop_off, pickup) => self.lookup(record, Leg::DeadHead, drop_off, pickup),
        }
    }
}

/// Resolve shipped and dead-head distances for every record.
///
/// The result depends only on the set of input records, not on their order.
pub fn resolve(shipments: &[ShipmentRecord], distances: &DistanceTable) -> Resolution {
    let mut order: Vec<usize> = (0..shipments.len()).collect();
    order.sort_by(|&a, &b| order_key(&shipments[a]).cmp(&order_key(&shipments[b])));

    // `order` is already sorted by (vehicle, start_time, shipment_id), so each
    // partition comes out sorted too.
    let mut partitions: BTreeMap<VehicleId, Vec<usize>> = BTreeMap::new();
    for &idx in &order {
        let record = &shipments[idx];
        if !record.transporter_type.accrues_dead_head() {
            continue;
        }
        if let Some(vehicle_id) = record.vehicle_id() {
            partitions.entry(vehicle_id).or_default().push(idx);
        }
    }

    let mut successors: HashMap<usize, Successor> = HashMap::with_capacity(order.len());
    for partition in partitions.values() {
        for (current, next) in successor_pairs(partition) {
            let successor = match next {
                Some(next) => Successor::Next(next),
                None => Successor::Last,
            };
            successors.insert(current, successor);
        }
    }

    let mut legs = LegResolver {
        distances,
        diagnostics: Vec::new(),
        missing_distances: 0,
        unresolved_vehicles: 0,
    };
    let mut resolved = Vec::with_capacity(order.len());

    for idx in order {
        let record = &shipments[idx];
        let shipped = legs.shipped(record);

        let successor = successors.remove(&idx).unwrap_or(Successor::Ineligible);
        let (next_origin, dead_head) = match successor {
            Successor::Next(next) => {
                let next_origin = shipments[next].origin_point_id.clone();
                let dead_head = legs.dead_head(record, next_origin.as_ref());
                (next_origin, dead_head)
            }
            Successor::Last => (None, 0.0),
            Successor::Ineligible => {
                if record.transporter_type.accrues_dead_head() {
                    if let Some(issue) = record.binding.issue() {
                        legs.flag(record, DiagnosticKind::UnresolvedVehicle { issue });
                    }
                }
                (None, 0.0)
            }
        };

        resolved.push(ResolvedShipment::new(
            record.clone(),
            next_origin,
            shipped,
            dead_head,
        ));
    }

    let shipped_sum: f64 = resolved.iter().map(|r| r.shipped_distance.value()).sum();
    let dead_head_sum: f64 = resolved.iter().map(|r| r.dead_head_distance.value()).sum();
    let totals = ResolutionTotals {
        shipments: resolved.len(),
        shipped_distance: km(shipped_sum),
        dead_head_distance: km(dead_head_sum),
        total_distance: km(shipped_sum + dead_head_sum),
        missing_distances: legs.missing_distances,
        unresolved_vehicles: legs.unresolved_vehicles,
    };

    if totals.missing_distances > 0 || totals.unresolved_vehicles > 0 {
        log::warn!(
            "Resolved {} shipments with {} missing distances and {} unresolved vehicles; affected legs counted as 0 km",
            totals.shipments,
            totals.missing_distances,
            totals.unresolved_vehicles
        );
    } else {
        log::debug!("Resolved {} shipments", totals.shipments);
    }

    Resolution {
        shipments: resolved,
        diagnostics: legs.diagnostics,
        totals,
    }
}

#[cfg(test)]
#[path = "deadhead_tests.rs"]
mod tests;
