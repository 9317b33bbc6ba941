//! Configuration for profile-insights

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::InsightsError;

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the SQLite database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Days a view event is kept before the retention sweep removes it
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Staleness ceiling for cached completeness results, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,

    /// User sample size for batch completion reports
    #[serde(default = "default_sample_limit")]
    pub sample_limit: i64,

    /// Default span for per-day view history series
    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_retention_days() -> i64 {
    90
}

fn default_cache_ttl_secs() -> i64 {
    3600
}

fn default_sample_limit() -> i64 {
    100
}

fn default_history_days() -> u32 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            retention_days: default_retention_days(),
            cache_ttl_secs: default_cache_ttl_secs(),
            sample_limit: default_sample_limit(),
            history_days: default_history_days(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing keys
    pub fn load(path: &Path) -> Result<Self, InsightsError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| InsightsError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retention_days, 90);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.sample_limit, 100);
        assert_eq!(config.history_days, 30);
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str("retention_days = 30").unwrap();
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.cache_ttl_secs, 3600);
    }
}
