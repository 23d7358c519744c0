//! Request and response types specific to the REST API.
//!
//! Response bodies are mostly the route types re-exported from `api`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use crate::api::{
    AttendanceSheet, AttendanceSubmission, DashboardData, DatasetInfo, DiagnosticsReport,
    FilterOptions, ShipmentPage,
};
use crate::services::filters::{DateRange, FilterSpec};

/// Dashboard filter as query parameters. List parameters are comma
/// separated; a missing date bound leaves that side open.
///
/// Names that themselves contain a comma cannot be expressed here. Send a
/// JSON [`FilterSpec`] to `POST /v1/dashboard` to filter on those.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub transporters: Option<String>,
    #[serde(default)]
    pub transporter_types: Option<String>,
    #[serde(default)]
    pub origin_points: Option<String>,
    #[serde(default)]
    pub destination_points: Option<String>,
    #[serde(default)]
    pub segments: Option<String>,
    /// Page size for `/v1/shipments`
    #[serde(default)]
    pub limit: Option<usize>,
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl FilterQuery {
    pub fn to_filter(&self) -> FilterSpec {
        let date_range = match (self.start_date, self.end_date) {
            (None, None) => None,
            (start, end) => Some(DateRange::new(
                start.unwrap_or(NaiveDate::MIN),
                end.unwrap_or(NaiveDate::MAX),
            )),
        };

        FilterSpec {
            date_range,
            transporters: split_list(self.transporters.as_deref()),
            transporter_types: split_list(self.transporter_types.as_deref()),
            origin_points: split_list(self.origin_points.as_deref()),
            destination_points: split_list(self.destination_points.as_deref()),
            segments: split_list(self.segments.as_deref()),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Data source connection status
    pub database: String,
    /// Version of the cached snapshot, if one is loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_lists_are_split_and_trimmed() {
        let query = FilterQuery {
            transporters: Some("Alwefaq national transport, Al -Rehab Office for Transport and,".into()),
            segments: Some("Qalyub".into()),
            ..FilterQuery::default()
        };
        let filter = query.to_filter();
        assert_eq!(filter.transporters.len(), 2);
        assert!(filter.transporters.contains("Alwefaq national transport"));
        assert_eq!(filter.segments.len(), 1);
        assert!(filter.origin_points.is_empty());
        assert!(filter.date_range.is_none());
    }

    #[test]
    fn test_single_date_bound_is_open_ended() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let query = FilterQuery {
            start_date: Some(start),
            ..FilterQuery::default()
        };
        let range = query.to_filter().date_range.unwrap();
        assert_eq!(range.start, start);
        assert!(range.contains(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()));
    }
}
