use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Diagnostic;
use crate::services::deadhead::{ResolutionTotals, ResolvedShipment};

// =========================================================
// Dataset inspection types + routes
// =========================================================

/// Identity and size of the loaded snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub version: String,
    pub loaded_at: DateTime<Utc>,
    pub shipments: usize,
    pub vehicles: usize,
    pub distance_pairs: usize,
    pub diagnostics: usize,
    pub totals: ResolutionTotals,
}

/// Processed rows matching a filter, truncated to `limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentPage {
    /// Number of rows matching the filter before truncation.
    pub total: usize,
    pub limit: usize,
    pub rows: Vec<ResolvedShipment>,
}

/// All findings of the loaded snapshot, counted per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub dataset_version: String,
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

pub const GET_SHIPMENTS: &str = "get_shipments";
pub const GET_DIAGNOSTICS: &str = "get_diagnostics";
pub const REFRESH_DATASET: &str = "refresh_dataset";

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limits() {
        assert!(DEFAULT_PAGE_LIMIT <= MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_empty_report_serializes() {
        let report = DiagnosticsReport {
            dataset_version: "abc".to_string(),
            total: 0,
            counts: BTreeMap::new(),
            diagnostics: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"], 0);
        assert!(json["counts"].as_object().unwrap().is_empty());
    }
}
