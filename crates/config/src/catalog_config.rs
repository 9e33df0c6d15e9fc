//! Catalog panel configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Catalog panel and duration probe settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Start with the chapter list collapsed
    pub start_collapsed: bool,

    /// Upper bound for one metadata probe in milliseconds
    pub probe_timeout_ms: u64,

    /// Number of probes allowed to run at once
    pub max_concurrent_probes: usize,
}

impl CatalogConfig {
    /// Returns the probe timeout as a duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            start_collapsed: false,
            probe_timeout_ms: 10_000,
            max_concurrent_probes: 4,
        }
    }
}

impl ConfigSection for CatalogConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(
                self.probe_timeout_ms,
                100,
                60_000,
                "catalog.probe_timeout_ms",
            ),
            Validator::in_range(
                self.max_concurrent_probes,
                1,
                16,
                "catalog.max_concurrent_probes",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.start_collapsed = other.start_collapsed;
        self.probe_timeout_ms = other.probe_timeout_ms;
        self.max_concurrent_probes = other.max_concurrent_probes;
    }

    fn section_name(&self) -> &'static str {
        "catalog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CatalogConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.probe_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = CatalogConfig::default();
        config.probe_timeout_ms = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multiple_validation_errors() {
        let config = CatalogConfig {
            probe_timeout_ms: 120_000,
            max_concurrent_probes: 0,
            ..Default::default()
        };

        assert_eq!(config.validate().unwrap_err().len(), 2);
    }
}
