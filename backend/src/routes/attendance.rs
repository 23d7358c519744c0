use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceMonth, DayFraction};

// =========================================================
// Attendance types + routes
// =========================================================

/// Body of an attendance upsert. `daily_log` holds one value per day of the
/// month, each `0`, `0.5` or `1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSubmission {
    #[serde(default)]
    pub driver_id: Option<String>,
    pub daily_log: Vec<f64>,
}

/// One vehicle row of the monthly sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSheetRow {
    pub plate_number: String,
    pub driver_id: Option<String>,
    pub daily_log: Vec<DayFraction>,
    pub total_working_days: f64,
    /// `None` until the row has been submitted once.
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSheet {
    pub month: AttendanceMonth,
    pub days_in_month: usize,
    pub rows: Vec<AttendanceSheetRow>,
}

pub const GET_ATTENDANCE_SHEET: &str = "get_attendance_sheet";
pub const PUT_ATTENDANCE: &str = "put_attendance";
