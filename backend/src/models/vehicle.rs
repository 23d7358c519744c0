//! Vehicle reference data and time-windowed segment assignments.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::api::VehicleId;

/// Vehicle reference row as delivered by the data provider.
///
/// A row carrying a segment is an assignment valid over
/// `[valid_from, valid_to)`; a missing bound is open-ended. A row without a
/// segment only registers the vehicle and its plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRow {
    pub vehicle_id: i64,
    pub plate_number: String,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub valid_from: Option<NaiveDateTime>,
    #[serde(default)]
    pub valid_to: Option<NaiveDateTime>,
}

/// A vehicle's segment classification over a half-open time window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleAssignment {
    pub segment: String,
    pub period_start: Option<NaiveDateTime>,
    pub period_end: Option<NaiveDateTime>,
}

impl VehicleAssignment {
    /// Inclusive start, exclusive end.
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.period_start.map_or(true, |start| start <= at)
            && self.period_end.map_or(true, |end| at < end)
    }
}

/// Why a shipment could not be tied to a single vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleIssue {
    /// The ledger row has no vehicle id.
    Missing,
    /// The vehicle id is absent from the reference data.
    Unregistered,
    /// Two or more assignment windows contain the shipment time.
    Ambiguous,
}

/// Result of binding a ledger row to the vehicle registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VehicleBinding {
    Bound {
        vehicle_id: VehicleId,
        plate_number: String,
        segment: Option<String>,
    },
    Missing,
    Unregistered {
        vehicle_id: VehicleId,
    },
    Ambiguous {
        vehicle_id: VehicleId,
        plate_number: String,
        segments: Vec<String>,
    },
}

impl VehicleBinding {
    /// Vehicle id usable for per-vehicle sequencing. Only bound vehicles qualify.
    pub fn vehicle_id(&self) -> Option<VehicleId> {
        match self {
            VehicleBinding::Bound { vehicle_id, .. } => Some(*vehicle_id),
            _ => None,
        }
    }

    /// Raw id reported by the ledger, whatever the binding outcome.
    pub fn raw_vehicle_id(&self) -> Option<VehicleId> {
        match self {
            VehicleBinding::Bound { vehicle_id, .. }
            | VehicleBinding::Unregistered { vehicle_id }
            | VehicleBinding::Ambiguous { vehicle_id, .. } => Some(*vehicle_id),
            VehicleBinding::Missing => None,
        }
    }

    pub fn plate_number(&self) -> Option<&str> {
        match self {
            VehicleBinding::Bound { plate_number, .. }
            | VehicleBinding::Ambiguous { plate_number, .. } => Some(plate_number),
            _ => None,
        }
    }

    pub fn segment(&self) -> Option<&str> {
        match self {
            VehicleBinding::Bound { segment, .. } => segment.as_deref(),
            _ => None,
        }
    }

    pub fn issue(&self) -> Option<VehicleIssue> {
        match self {
            VehicleBinding::Bound { .. } => None,
            VehicleBinding::Missing => Some(VehicleIssue::Missing),
            VehicleBinding::Unregistered { .. } => Some(VehicleIssue::Unregistered),
            VehicleBinding::Ambiguous { .. } => Some(VehicleIssue::Ambiguous),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct VehicleEntry {
    plate_number: Option<String>,
    assignments: BTreeSet<VehicleAssignment>,
}

/// Lookup structure over the vehicle reference rows.
#[derive(Debug, Clone, Default)]
pub struct VehicleRegistry {
    vehicles: BTreeMap<VehicleId, VehicleEntry>,
}

impl VehicleRegistry {
    /// Build the registry. Identical assignment rows collapse into one; when a
    /// vehicle is listed under several plates the lexicographically smallest
    /// non-blank plate wins so the result does not depend on row order.
    pub fn from_rows(rows: &[VehicleRow]) -> Self {
        let mut vehicles: BTreeMap<VehicleId, VehicleEntry> = BTreeMap::new();

        for row in rows {
            let entry = vehicles.entry(VehicleId::new(row.vehicle_id)).or_default();

            let plate = row.plate_number.trim();
            if !plate.is_empty() {
                match &entry.plate_number {
                    Some(current) if current.as_str() <= plate => {}
                    _ => entry.plate_number = Some(plate.to_string()),
                }
            }

            if let Some(segment) = row.segment.as_deref().map(str::trim) {
                if !segment.is_empty() {
                    entry.assignments.insert(VehicleAssignment {
                        segment: segment.to_string(),
                        period_start: row.valid_from,
                        period_end: row.valid_to,
                    });
                }
            }
        }

        Self { vehicles }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn contains(&self, vehicle_id: VehicleId) -> bool {
        self.vehicles.contains_key(&vehicle_id)
    }

    pub fn plate_number(&self, vehicle_id: VehicleId) -> Option<&str> {
        self.vehicles
            .get(&vehicle_id)
            .and_then(|v| v.plate_number.as_deref())
    }

    /// Assignments whose window contains `at`.
    pub fn assignments_at(
        &self,
        vehicle_id: VehicleId,
        at: NaiveDateTime,
    ) -> Vec<&VehicleAssignment> {
        self.vehicles
            .get(&vehicle_id)
            .map(|v| v.assignments.iter().filter(|a| a.contains(at)).collect())
            .unwrap_or_default()
    }

    /// Tie a ledger vehicle id to the registry at the given instant.
    pub fn bind(&self, vehicle_id: Option<VehicleId>, at: NaiveDateTime) -> VehicleBinding {
        let Some(vehicle_id) = vehicle_id else {
            return VehicleBinding::Missing;
        };
        let Some(entry) = self.vehicles.get(&vehicle_id) else {
            return VehicleBinding::Unregistered { vehicle_id };
        };

        let plate_number = entry
            .plate_number
            .clone()
            .unwrap_or_else(|| vehicle_id.to_string());

        let active: Vec<&VehicleAssignment> = entry
            .assignments
            .iter()
            .filter(|a| a.contains(at))
            .collect();

        match active.as_slice() {
            [] => VehicleBinding::Bound {
                vehicle_id,
                plate_number,
                segment: None,
            },
            [only] => VehicleBinding::Bound {
                vehicle_id,
                plate_number,
                segment: Some(only.segment.clone()),
            },
            _ => {
                let segments: BTreeSet<&str> = active.iter().map(|a| a.segment.as_str()).collect();
                VehicleBinding::Ambiguous {
                    vehicle_id,
                    plate_number,
                    segments: segments.into_iter().map(str::to_string).collect(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn row(id: i64, plate: &str, segment: Option<&str>) -> VehicleRow {
        VehicleRow {
            vehicle_id: id,
            plate_number: plate.to_string(),
            segment: segment.map(str::to_string),
            valid_from: None,
            valid_to: None,
        }
    }

    #[test]
    fn test_bind_missing_and_unregistered() {
        let registry = VehicleRegistry::from_rows(&[row(1, "ABC 123", None)]);
        assert_eq!(registry.bind(None, at(1)), VehicleBinding::Missing);
        assert_eq!(
            registry.bind(Some(VehicleId::new(2)), at(1)),
            VehicleBinding::Unregistered {
                vehicle_id: VehicleId::new(2)
            }
        );
    }

    #[test]
    fn test_bind_without_assignment_has_no_segment() {
        let registry = VehicleRegistry::from_rows(&[row(1, "ABC 123", None)]);
        let binding = registry.bind(Some(VehicleId::new(1)), at(1));
        assert_eq!(binding.vehicle_id(), Some(VehicleId::new(1)));
        assert_eq!(binding.plate_number(), Some("ABC 123"));
        assert_eq!(binding.segment(), None);
    }

    #[test]
    fn test_identical_assignment_rows_are_not_ambiguous() {
        let registry = VehicleRegistry::from_rows(&[
            row(1, "ABC 123", Some("Qalyub")),
            row(1, "ABC 123", Some("Qalyub")),
        ]);
        let binding = registry.bind(Some(VehicleId::new(1)), at(1));
        assert_eq!(binding.segment(), Some("Qalyub"));
    }

    #[test]
    fn test_overlapping_segments_are_ambiguous() {
        let registry = VehicleRegistry::from_rows(&[
            row(1, "ABC 123", Some("Qalyub")),
            row(1, "ABC 123", Some("Delta")),
        ]);
        let binding = registry.bind(Some(VehicleId::new(1)), at(1));
        assert_eq!(binding.issue(), Some(VehicleIssue::Ambiguous));
        assert_eq!(binding.vehicle_id(), None);
        assert_eq!(binding.raw_vehicle_id(), Some(VehicleId::new(1)));
    }

    #[test]
    fn test_overlapping_windows_with_same_segment_are_ambiguous() {
        let mut early = row(1, "ABC 123", Some("Qalyub"));
        early.valid_from = Some(at(1));
        early.valid_to = Some(at(20));
        let mut late = row(1, "ABC 123", Some("Qalyub"));
        late.valid_from = Some(at(10));
        late.valid_to = Some(at(30));
        let registry = VehicleRegistry::from_rows(&[early, late]);

        let binding = registry.bind(Some(VehicleId::new(1)), at(15));
        assert_eq!(binding.issue(), Some(VehicleIssue::Ambiguous));
        assert_eq!(binding.vehicle_id(), None);
        match binding {
            VehicleBinding::Ambiguous { segments, .. } => assert_eq!(segments, vec!["Qalyub"]),
            other => panic!("unexpected binding {:?}", other),
        }

        // Outside the overlap only one window applies.
        assert_eq!(
            registry.bind(Some(VehicleId::new(1)), at(5)).segment(),
            Some("Qalyub")
        );
    }

    #[test]
    fn test_window_selects_current_assignment() {
        let mut first = row(1, "ABC 123", Some("Qalyub"));
        first.valid_to = Some(at(10));
        let mut second = row(1, "ABC 123", Some("Delta"));
        second.valid_from = Some(at(10));
        let registry = VehicleRegistry::from_rows(&[first, second]);

        assert_eq!(
            registry.bind(Some(VehicleId::new(1)), at(9)).segment(),
            Some("Qalyub")
        );
        // End is exclusive, start inclusive.
        assert_eq!(
            registry.bind(Some(VehicleId::new(1)), at(10)).segment(),
            Some("Delta")
        );
    }

    #[test]
    fn test_plate_choice_is_order_independent() {
        let a = VehicleRegistry::from_rows(&[row(1, "ZZZ 9", None), row(1, "AAA 1", None)]);
        let b = VehicleRegistry::from_rows(&[row(1, "AAA 1", None), row(1, "ZZZ 9", None)]);
        assert_eq!(a.plate_number(VehicleId::new(1)), Some("AAA 1"));
        assert_eq!(b.plate_number(VehicleId::new(1)), Some("AAA 1"));
    }
}
