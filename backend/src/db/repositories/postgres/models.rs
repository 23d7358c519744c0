use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Nullable, Text, Timestamp};
use serde_json::Value;

use super::schema::vehicle_attendance;
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{
    AttendanceMonth, AttendanceRecord, DayFraction, RouteDistanceRow, ShipmentLedgerRow,
    VehicleRow,
};

/// Row of the shipment ledger query.
#[derive(Debug, Clone, QueryableByName)]
pub struct LedgerQueryRow {
    #[diesel(sql_type = BigInt)]
    pub shipment: i64,
    #[diesel(sql_type = Nullable<Text>)]
    pub transporter_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub transporter_type_description: Option<String>,
    #[diesel(sql_type = Timestamp)]
    pub actual_shipment_start: NaiveDateTime,
    #[diesel(sql_type = Nullable<Text>)]
    pub shipping_point: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub receiving_point: Option<String>,
    #[diesel(sql_type = Nullable<BigInt>)]
    pub vehicle_id: Option<i64>,
}

impl From<LedgerQueryRow> for ShipmentLedgerRow {
    fn from(row: LedgerQueryRow) -> Self {
        ShipmentLedgerRow {
            shipment_id: row.shipment,
            transporter_name: row.transporter_name,
            transporter_type: row.transporter_type_description,
            start_time: row.actual_shipment_start,
            origin_point: row.shipping_point,
            destination_point: row.receiving_point,
            vehicle_id: row.vehicle_id,
        }
    }
}

/// Row of the vehicle/assignment query.
#[derive(Debug, Clone, QueryableByName)]
pub struct VehicleQueryRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub plate_number_assigned: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub segment: Option<String>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub valid_from: Option<NaiveDateTime>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub valid_to: Option<NaiveDateTime>,
}

impl From<VehicleQueryRow> for VehicleRow {
    fn from(row: VehicleQueryRow) -> Self {
        VehicleRow {
            vehicle_id: row.id,
            plate_number: row.plate_number_assigned,
            segment: row.segment,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
        }
    }
}

/// Row of the route distance query.
#[derive(Debug, Clone, QueryableByName)]
pub struct DistanceQueryRow {
    #[diesel(sql_type = Nullable<Text>)]
    pub shipping_point: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub receiving_point: Option<String>,
    #[diesel(sql_type = Nullable<Double>)]
    pub distance: Option<f64>,
}

impl From<DistanceQueryRow> for RouteDistanceRow {
    fn from(row: DistanceQueryRow) -> Self {
        RouteDistanceRow {
            origin_point: row.shipping_point,
            destination_point: row.receiving_point,
            distance: row.distance,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = vehicle_attendance)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AttendanceRow {
    pub month: String,
    pub vehicle_plate_number: String,
    pub driver_id: Option<String>,
    pub daily_log: Value,
    pub total_working_days: f64,
    pub last_updated: DateTime<Utc>,
}

impl AttendanceRow {
    pub fn from_record(record: &AttendanceRecord) -> RepositoryResult<Self> {
        let daily_log = serde_json::to_value(&record.daily_log).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Failed to encode daily log: {}", e),
                ErrorContext::new("upsert_attendance").with_entity_id(&record.plate_number),
            )
        })?;
        Ok(Self {
            month: record.month.to_string(),
            vehicle_plate_number: record.plate_number.clone(),
            driver_id: record.driver_id.clone(),
            daily_log,
            total_working_days: record.total_working_days,
            last_updated: record.last_updated,
        })
    }

    pub fn into_record(self) -> RepositoryResult<AttendanceRecord> {
        let context = || {
            ErrorContext::new("decode_attendance")
                .with_entity("vehicle_attendance")
                .with_entity_id(format!("{}/{}", self.month, self.vehicle_plate_number))
        };
        let month: AttendanceMonth = self
            .month
            .parse()
            .map_err(|e: String| RepositoryError::internal_with_context(e, context()))?;
        let daily_log: Vec<DayFraction> = serde_json::from_value(self.daily_log.clone())
            .map_err(|e| RepositoryError::internal_with_context(e.to_string(), context()))?;

        Ok(AttendanceRecord {
            month,
            plate_number: self.vehicle_plate_number,
            driver_id: self.driver_id,
            daily_log,
            total_working_days: self.total_working_days,
            last_updated: self.last_updated,
        })
    }
}
