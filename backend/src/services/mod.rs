//! Service layer.
//!
//! Sits between the repositories and the HTTP handlers: loads and caches the
//! dataset, resolves dead-head legs once per snapshot, and filters and
//! aggregates per request.

pub mod attendance;
pub mod dashboard;
pub mod deadhead;
pub mod error;
pub mod filters;
pub mod reporting;
pub mod snapshot;

pub use dashboard::{compute_dashboard, diagnostics_report, filter_options, shipment_page};
pub use deadhead::{resolve, Resolution, ResolutionTotals, ResolvedShipment};
pub use error::{ServiceError, ServiceResult};
pub use filters::{DateRange, FilterSpec};
pub use snapshot::{DatasetSnapshot, SnapshotCache};
