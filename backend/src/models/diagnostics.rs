//! Data-quality findings raised while loading and resolving the dataset.
//!
//! Nothing in the resolver path is fatal: a missing route distance or an
//! unbindable vehicle degrades the affected leg to zero and leaves a
//! [`Diagnostic`] behind so totals stay auditable.

use serde::{Deserialize, Serialize};

use super::vehicle::VehicleIssue;
use crate::api::{PointId, ShipmentId, VehicleId};

/// Which leg of a shipment a finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    /// Loaded leg, origin to destination.
    Shipped,
    /// Empty leg, destination to the next pickup.
    DeadHead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// One of the points needed for the leg is unknown.
    MissingPoint { leg: Leg },
    /// The point pair has no entry in the distance table.
    MissingDistance { leg: Leg, from: PointId, to: PointId },
    /// A dead-head eligible shipment could not be placed in a vehicle sequence.
    UnresolvedVehicle { issue: VehicleIssue },
    /// Another ledger row with the same shipment id was kept instead.
    DuplicateShipment,
    /// Several distances were supplied for one ordered point pair.
    DuplicateDistance {
        from: PointId,
        to: PointId,
        candidates: Vec<f64>,
        kept: f64,
    },
    /// Distance row rejected at load time.
    InvalidDistance {
        from: Option<PointId>,
        to: Option<PointId>,
        value: Option<f64>,
    },
}

impl DiagnosticKind {
    /// Stable code used for grouping in reports.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::MissingPoint { .. } => "missing_point",
            DiagnosticKind::MissingDistance { .. } => "missing_distance",
            DiagnosticKind::UnresolvedVehicle { .. } => "unresolved_vehicle",
            DiagnosticKind::DuplicateShipment => "duplicate_shipment",
            DiagnosticKind::DuplicateDistance { .. } => "duplicate_distance",
            DiagnosticKind::InvalidDistance { .. } => "invalid_distance",
        }
    }

    /// Whether the finding zeroed out (part of) a shipment's distance.
    pub fn affects_distance(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::MissingPoint { .. }
                | DiagnosticKind::MissingDistance { .. }
                | DiagnosticKind::UnresolvedVehicle { .. }
        )
    }
}

/// A single data-quality finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shipment_id: Option<ShipmentId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vehicle_id: Option<VehicleId>,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn for_shipment(
        shipment_id: ShipmentId,
        vehicle_id: Option<VehicleId>,
        kind: DiagnosticKind,
    ) -> Self {
        Self {
            shipment_id: Some(shipment_id),
            vehicle_id,
            kind,
        }
    }

    /// Finding that belongs to the reference data rather than a shipment.
    pub fn for_dataset(kind: DiagnosticKind) -> Self {
        Self {
            shipment_id: None,
            vehicle_id: None,
            kind,
        }
    }
}
