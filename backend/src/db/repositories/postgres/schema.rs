// Tables owned by this service. Provider tables (truck_utilization,
// route_info, ...) are read through raw SQL and not declared here.

diesel::table! {
    vehicle_attendance (month, vehicle_plate_number) {
        month -> Text,
        vehicle_plate_number -> Text,
        driver_id -> Nullable<Text>,
        daily_log -> Jsonb,
        total_working_days -> Float8,
        last_updated -> Timestamptz,
    }
}
