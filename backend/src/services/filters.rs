//! Dashboard filter predicate.
//!
//! Every constraint is conjunctive. An empty set means "no constraint".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::deadhead::ResolvedShipment;
use super::error::{ServiceError, ServiceResult};

/// Closed calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub date_range: Option<DateRange>,
    pub transporters: BTreeSet<String>,
    /// Matched case-insensitively against the transporter type label.
    pub transporter_types: BTreeSet<String>,
    pub origin_points: BTreeSet<String>,
    pub destination_points: BTreeSet<String>,
    /// A non-empty set excludes records without a segment.
    pub segments: BTreeSet<String>,
}

fn allows(set: &BTreeSet<String>, value: Option<&str>) -> bool {
    set.is_empty() || value.is_some_and(|v| set.contains(v))
}

impl FilterSpec {
    pub fn validate(&self) -> ServiceResult<()> {
        if let Some(range) = &self.date_range {
            if range.start > range.end {
                return Err(ServiceError::InvalidFilter(format!(
                    "date range start {} is after end {}",
                    range.start, range.end
                )));
            }
        }
        Ok(())
    }

    pub fn is_unconstrained(&self) -> bool {
        self == &FilterSpec::default()
    }

    pub fn matches(&self, resolved: &ResolvedShipment) -> bool {
        let record = &resolved.shipment;

        if let Some(range) = &self.date_range {
            if !range.contains(record.shipment_date()) {
                return false;
            }
        }

        let type_allowed = self.transporter_types.is_empty()
            || self
                .transporter_types
                .iter()
                .any(|t| t.trim().eq_ignore_ascii_case(record.transporter_type.as_str()));

        type_allowed
            && allows(&self.transporters, Some(record.transporter_id.as_str()))
            && allows(
                &self.origin_points,
                record.origin_point_id.as_ref().map(|p| p.as_str()),
            )
            && allows(
                &self.destination_points,
                record.destination_point_id.as_ref().map(|p| p.as_str()),
            )
            && allows(&self.segments, record.segment())
    }

    /// Validate, then keep the matching records in their resolved order.
    pub fn apply<'a>(
        &self,
        shipments: &'a [ResolvedShipment],
    ) -> ServiceResult<Vec<&'a ResolvedShipment>> {
        self.validate()?;
        Ok(shipments.iter().filter(|r| self.matches(r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PointId, ShipmentId, VehicleId};
    use crate::models::{DistanceTable, ShipmentRecord, TransporterType, VehicleBinding};
    use crate::services::deadhead::resolve;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn record(id: i64, d: u32, transporter: &str, segment: Option<&str>) -> ShipmentRecord {
        ShipmentRecord {
            shipment_id: ShipmentId::new(id),
            binding: VehicleBinding::Bound {
                vehicle_id: VehicleId::new(id),
                plate_number: format!("P{}", id),
                segment: segment.map(str::to_string),
            },
            transporter_id: transporter.to_string(),
            transporter_type: TransporterType::Dedicated,
            start_time: day(d).and_hms_opt(10, 0, 0).unwrap(),
            origin_point_id: Some(PointId::new("A")),
            destination_point_id: Some(PointId::new("B")),
        }
    }

    fn resolved() -> Vec<ResolvedShipment> {
        let records = vec![
            record(1, 1, "Rehab", Some("Qalyub")),
            record(2, 2, "Wefaq", None),
            record(3, 3, "Rehab", Some("Delta")),
        ];
        resolve(&records, &DistanceTable::from_pairs([("A", "B", 10.0)])).shipments
    }

    fn ids(rows: &[&ResolvedShipment]) -> Vec<i64> {
        rows.iter().map(|r| r.shipment.shipment_id.value()).collect()
    }

    #[test]
    fn test_default_filter_matches_everything() {
        let rows = resolved();
        let filter = FilterSpec::default();
        assert!(filter.is_unconstrained());
        assert_eq!(ids(&filter.apply(&rows).unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn test_date_range_is_closed() {
        let rows = resolved();
        let filter = FilterSpec {
            date_range: Some(DateRange::new(day(2), day(3))),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&rows).unwrap()), vec![2, 3]);
    }

    #[test]
    fn test_inverted_date_range_is_rejected() {
        let filter = FilterSpec {
            date_range: Some(DateRange::new(day(3), day(1))),
            ..Default::default()
        };
        assert!(matches!(
            filter.apply(&resolved()),
            Err(ServiceError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_segment_filter_excludes_unsegmented() {
        let rows = resolved();
        let filter = FilterSpec {
            segments: ["Qalyub".to_string(), "Delta".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&rows).unwrap()), vec![1, 3]);
    }

    #[test]
    fn test_constraints_are_conjunctive() {
        let rows = resolved();
        let filter = FilterSpec {
            transporters: ["Rehab".to_string()].into(),
            segments: ["Delta".to_string()].into(),
            transporter_types: ["DEDICATED".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&rows).unwrap()), vec![3]);

        let spot_only = FilterSpec {
            transporter_types: ["spot".to_string()].into(),
            ..Default::default()
        };
        assert!(spot_only.apply(&rows).unwrap().is_empty());
    }

    #[test]
    fn test_filter_deserializes_with_defaults() {
        let filter: FilterSpec =
            serde_json::from_str(r#"{"origin_points": ["A"], "date_range": {"start": "2024-07-01", "end": "2024-07-02"}}"#)
                .unwrap();
        assert_eq!(filter.origin_points.len(), 1);
        assert!(filter.transporters.is_empty());
        assert_eq!(filter.date_range, Some(DateRange::new(day(1), day(2))));
    }
}
