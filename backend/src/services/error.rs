//! Error type shared by the service layer.

use crate::db::RepositoryError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
#[allow(clippy::result_large_err)]
pub enum ServiceError {
    /// The dataset could not be loaded. No partial dashboard is produced.
    #[error("Data source unavailable: {0}")]
    DataSource(#[source] RepositoryError),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid attendance submission: {0}")]
    InvalidAttendance(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn is_data_source(&self) -> bool {
        matches!(self, ServiceError::DataSource(_))
    }
}
