//! Public API surface for the Rust backend.
//!
//! This file consolidates the identifier newtypes and the DTO types exposed
//! to the presentation layer. All types derive Serialize/Deserialize for JSON
//! serialization.

pub use crate::routes::attendance::AttendanceSheet;
pub use crate::routes::attendance::AttendanceSheetRow;
pub use crate::routes::attendance::AttendanceSubmission;
pub use crate::routes::dashboard::DailyDistancePoint;
pub use crate::routes::dashboard::DashboardData;
pub use crate::routes::dashboard::DashboardSummary;
pub use crate::routes::dashboard::FilterOptions;
pub use crate::routes::dashboard::JumboAverage;
pub use crate::routes::dashboard::TransporterDeadHead;
pub use crate::routes::dataset::DatasetInfo;
pub use crate::routes::dataset::DiagnosticsReport;
pub use crate::routes::dataset::ShipmentPage;

pub use crate::models::{
    AttendanceMonth, AttendanceRecord, DayFraction, Diagnostic, DiagnosticKind, Leg,
    ShipmentRecord, TransporterType, VehicleBinding, VehicleIssue,
};
pub use crate::services::deadhead::{Resolution, ResolutionTotals, ResolvedShipment};
pub use crate::services::filters::{DateRange, FilterSpec};

crate::define_id_type!(i64, ShipmentId);
crate::define_id_type!(i64, VehicleId);

crate::define_name_type!(PointId);

/// Distance unit used across the crate. Route tables store kilometres.
pub type Distance = qtty::Kilometers;

/// Build a distance value from raw kilometres.
pub fn km(value: f64) -> Distance {
    qtty::Kilometers::new(value)
}

/// Transporter label used when the ledger row carries no transporter name.
pub const UNKNOWN_TRANSPORTER: &str = "Unknown";

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
