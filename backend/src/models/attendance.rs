//! Monthly attendance log for rental vehicles.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Calendar month, printed and parsed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttendanceMonth(NaiveDate);

impl AttendanceMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, String> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(AttendanceMonth)
            .ok_or_else(|| format!("invalid month {:04}-{:02}", year, month))
    }

    /// Month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        // Day 1 of an existing date's month always exists.
        AttendanceMonth(date.with_day(1).unwrap_or(date))
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn days_in_month(&self) -> usize {
        match self.0.checked_add_months(Months::new(1)) {
            Some(next) => (next - self.0).num_days() as usize,
            None => 31,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }
}

impl FromStr for AttendanceMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| format!("invalid month '{}', expected YYYY-MM", s))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(format!("invalid month '{}', expected YYYY-MM", s));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in '{}'", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in '{}'", s))?;
        AttendanceMonth::new(year, month)
    }
}

impl std::fmt::Display for AttendanceMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl TryFrom<String> for AttendanceMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AttendanceMonth> for String {
    fn from(value: AttendanceMonth) -> Self {
        value.to_string()
    }
}

/// Worked fraction of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum DayFraction {
    #[default]
    Absent,
    Half,
    Full,
}

impl DayFraction {
    pub fn value(self) -> f64 {
        match self {
            DayFraction::Absent => 0.0,
            DayFraction::Half => 0.5,
            DayFraction::Full => 1.0,
        }
    }
}

impl TryFrom<f64> for DayFraction {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value == 0.0 {
            Ok(DayFraction::Absent)
        } else if value == 0.5 {
            Ok(DayFraction::Half)
        } else if value == 1.0 {
            Ok(DayFraction::Full)
        } else {
            Err(format!("invalid day fraction {}, expected 0, 0.5 or 1", value))
        }
    }
}

impl From<DayFraction> for f64 {
    fn from(value: DayFraction) -> Self {
        value.value()
    }
}

/// Attendance entry keyed by `(month, plate_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub month: AttendanceMonth,
    pub plate_number: String,
    pub driver_id: Option<String>,
    pub daily_log: Vec<DayFraction>,
    pub total_working_days: f64,
    pub last_updated: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Validates the plate and the log length; the total is always derived.
    pub fn new(
        month: AttendanceMonth,
        plate_number: &str,
        driver_id: Option<String>,
        daily_log: Vec<DayFraction>,
        last_updated: DateTime<Utc>,
    ) -> Result<Self, String> {
        let plate_number = plate_number.trim();
        if plate_number.is_empty() {
            return Err("plate number must not be blank".to_string());
        }
        let expected = month.days_in_month();
        if daily_log.len() != expected {
            return Err(format!(
                "daily log for {} must have {} entries, got {}",
                month,
                expected,
                daily_log.len()
            ));
        }
        let driver_id = driver_id
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            month,
            plate_number: plate_number.to_string(),
            driver_id,
            total_working_days: total_working_days(&daily_log),
            daily_log,
            last_updated,
        })
    }
}

pub fn total_working_days(log: &[DayFraction]) -> f64 {
    log.iter().map(|d| d.value()).sum()
}
