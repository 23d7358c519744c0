//! Dashboard configuration.
//!
//! Read from the `[dashboard]` section of `repository.toml`, then overridden
//! by environment variables:
//!
//! - `SNAPSHOT_TTL_SECS`
//! - `DUPLICATE_DISTANCE_POLICY` (`min` | `first_seen`)
//! - `JUMBO_SEGMENT`
//! - `JUMBO_TRANSPORTERS` (comma separated)
//! - `DEFAULT_PAGE_LIMIT`

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

use crate::models::DuplicateDistancePolicy;
use crate::routes::dataset::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

pub const DEFAULT_JUMBO_SEGMENT: &str = "Qalyub";
pub const DEFAULT_JUMBO_TRANSPORTERS: [&str; 2] = [
    "Al -Rehab Office for Transport and",
    "Alwefaq national transport",
];

/// Sub-segment and transporter allow-list defining jumbo shipments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumboConfig {
    #[serde(default = "default_jumbo_segment")]
    pub segment: String,
    #[serde(default = "default_jumbo_transporters")]
    pub transporters: BTreeSet<String>,
}

impl Default for JumboConfig {
    fn default() -> Self {
        Self {
            segment: default_jumbo_segment(),
            transporters: default_jumbo_transporters(),
        }
    }
}

impl JumboConfig {
    pub fn includes(&self, segment: Option<&str>, transporter: &str) -> bool {
        segment == Some(self.segment.as_str()) && self.transporters.contains(transporter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,
    #[serde(default)]
    pub duplicate_distance_policy: DuplicateDistancePolicy,
    #[serde(default)]
    pub jumbo: JumboConfig,
    #[serde(default = "default_page_limit")]
    pub default_page_limit: usize,
}

fn default_snapshot_ttl_secs() -> u64 {
    3600
}

fn default_jumbo_segment() -> String {
    DEFAULT_JUMBO_SEGMENT.to_string()
}

fn default_jumbo_transporters() -> BTreeSet<String> {
    DEFAULT_JUMBO_TRANSPORTERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_page_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl_secs: default_snapshot_ttl_secs(),
            duplicate_distance_policy: DuplicateDistancePolicy::default(),
            jumbo: JumboConfig::default(),
            default_page_limit: default_page_limit(),
        }
    }
}

impl DashboardConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, String> {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of `self`. Unset or blank variables
    /// leave the current value untouched.
    pub fn with_env_overrides(mut self) -> Result<Self, String> {
        if let Some(ttl) = read_var("SNAPSHOT_TTL_SECS") {
            self.snapshot_ttl_secs = ttl
                .parse()
                .map_err(|e| format!("Invalid SNAPSHOT_TTL_SECS '{}': {}", ttl, e))?;
        }
        if let Some(policy) = read_var("DUPLICATE_DISTANCE_POLICY") {
            self.duplicate_distance_policy = policy.parse()?;
        }
        if let Some(segment) = read_var("JUMBO_SEGMENT") {
            self.jumbo.segment = segment;
        }
        if let Some(list) = read_var("JUMBO_TRANSPORTERS") {
            self.jumbo.transporters = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(limit) = read_var("DEFAULT_PAGE_LIMIT") {
            self.default_page_limit = limit
                .parse()
                .map_err(|e| format!("Invalid DEFAULT_PAGE_LIMIT '{}': {}", limit, e))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.default_page_limit == 0 || self.default_page_limit > MAX_PAGE_LIMIT {
            return Err(format!(
                "default_page_limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            ));
        }
        Ok(())
    }

    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_ttl_secs)
    }
}

fn read_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.snapshot_ttl(), Duration::from_secs(3600));
        assert_eq!(config.jumbo.segment, "Qalyub");
        assert!(config
            .jumbo
            .transporters
            .contains("Alwefaq national transport"));
        assert_eq!(config.duplicate_distance_policy, DuplicateDistancePolicy::Min);
        assert_eq!(config.default_page_limit, 50);
    }

    #[test]
    fn test_partial_toml_section() {
        let config: DashboardConfig = toml::from_str(
            r#"
snapshot_ttl_secs = 60
duplicate_distance_policy = "first_seen"

[jumbo]
segment = "Delta"
"#,
        )
        .unwrap();
        assert_eq!(config.snapshot_ttl_secs, 60);
        assert_eq!(
            config.duplicate_distance_policy,
            DuplicateDistancePolicy::FirstSeen
        );
        assert_eq!(config.jumbo.segment, "Delta");
        assert_eq!(config.jumbo.transporters.len(), 2);
    }

    #[test]
    fn test_jumbo_includes() {
        let jumbo = JumboConfig::default();
        assert!(jumbo.includes(Some("Qalyub"), "Alwefaq national transport"));
        assert!(!jumbo.includes(None, "Alwefaq national transport"));
        assert!(!jumbo.includes(Some("Qalyub"), "Someone else"));
    }

    #[test]
    fn test_zero_page_limit_is_rejected() {
        let config = DashboardConfig {
            default_page_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
