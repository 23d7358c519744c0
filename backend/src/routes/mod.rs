pub mod attendance;
pub mod dashboard;
pub mod dataset;

#[cfg(test)]
mod tests {
    #[test]
    fn test_module_structure() {
        assert_eq!(super::dashboard::GET_DASHBOARD, "get_dashboard");
        assert_eq!(super::dashboard::GET_FILTER_OPTIONS, "get_filter_options");
        assert_eq!(super::dataset::GET_SHIPMENTS, "get_shipments");
        assert_eq!(super::dataset::GET_DIAGNOSTICS, "get_diagnostics");
        assert_eq!(super::dataset::REFRESH_DATASET, "refresh_dataset");
        assert_eq!(
            super::attendance::GET_ATTENDANCE_SHEET,
            "get_attendance_sheet"
        );
        assert_eq!(super::attendance::PUT_ATTENDANCE, "put_attendance");
    }
}
