use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::{Distance, VehicleId};

// =========================================================
// Dashboard types + route
// =========================================================

/// Daily sums of resolved distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDistancePoint {
    pub date: NaiveDate,
    pub shipments: usize,
    pub dead_head_distance: Distance,
    pub total_distance: Distance,
}

/// Average shipments per active day for one jumbo vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumboAverage {
    pub vehicle_id: VehicleId,
    pub plate_number: String,
    pub shipments: usize,
    pub active_days: usize,
    pub average_daily_shipments: f64,
}

/// Dead-head share per transporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransporterDeadHead {
    pub transporter: String,
    pub shipments: usize,
    pub dead_head_distance: Distance,
    pub total_distance: Distance,
    /// Always within `[0, 100]`; 0 when the transporter drove no distance.
    pub dead_head_percentage: f64,
}

/// Headline figures for the filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub shipments: usize,
    pub vehicles: usize,
    pub shipped_distance: Distance,
    pub dead_head_distance: Distance,
    pub total_distance: Distance,
    pub dead_head_percentage: f64,
}

/// Everything the dashboard renders for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    /// `false` when the filter matched nothing; render a "no data" notice.
    pub has_data: bool,
    pub summary: DashboardSummary,
    pub daily: Vec<DailyDistancePoint>,
    /// `false` when no jumbo shipment matched the filter.
    pub jumbo_available: bool,
    pub jumbo_segment: String,
    pub jumbo: Vec<JumboAverage>,
    pub transporters: Vec<TransporterDeadHead>,
    /// Findings attached to the filtered shipments.
    pub diagnostic_count: usize,
    pub dataset_version: String,
}

/// Choices offered by the filter widgets, taken from the loaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub transporters: Vec<String>,
    pub transporter_types: Vec<String>,
    pub origin_points: Vec<String>,
    pub destination_points: Vec<String>,
    pub segments: Vec<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

pub const GET_DASHBOARD: &str = "get_dashboard";
pub const GET_FILTER_OPTIONS: &str = "get_filter_options";
