//! Content fingerprints for loaded provider tables.

use sha2::{Digest, Sha256};

use super::repository::{RepositoryError, RepositoryResult};
use super::services::DatasetRows;

/// Hex-encoded SHA-256 of `content`.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Version tag of a dataset: the checksum of its rows in provider order.
///
/// Two loads of unchanged tables yield the same tag, so callers can tell a
/// refresh that picked up new rows from one that did not.
pub fn dataset_version(rows: &DatasetRows) -> RepositoryResult<String> {
    let canonical = serde_json::to_string(rows)
        .map_err(|e| RepositoryError::internal(format!("Failed to encode dataset rows: {}", e)))?;
    Ok(calculate_checksum(&canonical))
}
