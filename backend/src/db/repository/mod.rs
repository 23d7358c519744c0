//! Repository traits.
//!
//! - [`DatasetRepository`]: read-only provider tables (ledger, vehicles, distances)
//! - [`AttendanceRepository`]: attendance log upserts and reads
//! - [`FullRepository`]: both, implemented automatically

pub mod attendance;
pub mod dataset;
pub mod error;

pub use attendance::AttendanceRepository;
pub use dataset::DatasetRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Everything the application needs from a backend.
pub trait FullRepository: DatasetRepository + AttendanceRepository {}

impl<T> FullRepository for T where T: DatasetRepository + AttendanceRepository {}
