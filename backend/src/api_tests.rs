use super::*;

#[test]
fn test_vehicle_id_ordering() {
    let a = VehicleId::new(1);
    let b = VehicleId::new(2);
    assert!(a < b);
    assert_eq!(VehicleId::from(2), b);
    assert_eq!(i64::from(b), 2);
}

#[test]
fn test_ids_serialize_transparently() {
    let json = serde_json::to_string(&ShipmentId::new(42)).unwrap();
    assert_eq!(json, "42");
    let point: PointId = serde_json::from_str("\"Cairo DC\"").unwrap();
    assert_eq!(point.as_str(), "Cairo DC");
}

#[test]
fn test_point_id_parse_rejects_blank() {
    assert_eq!(PointId::parse(Some("  ")), None);
    assert_eq!(PointId::parse(None), None);
    assert_eq!(PointId::parse(Some(" Tanta ")), Some(PointId::new("Tanta")));
}

#[test]
fn test_km_wraps_value() {
    assert_eq!(km(12.5).value(), 12.5);
}

#[test]
fn test_filter_spec_deserializes_partial_json() {
    let filter: FilterSpec = serde_json::from_str(
        r#"{"transporters": ["Alwefaq national transport"], "date_range": {"start": "2024-01-01", "end": "2024-01-31"}}"#,
    )
    .unwrap();
    assert_eq!(filter.transporters.len(), 1);
    assert!(filter.segments.is_empty());
    assert!(filter.validate().is_ok());
}
