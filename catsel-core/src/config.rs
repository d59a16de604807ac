//! Configuration types

use crate::error::{CatselError, CatselResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration for the category-tree cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatselConfig {
    /// When false every request rebuilds the tree and nothing is written.
    pub cache_enabled: bool,
    /// Directory for the LMDB cache. `None` selects the in-memory cache.
    pub lmdb_path: Option<PathBuf>,
    /// LMDB map size in megabytes.
    pub lmdb_max_size_mb: usize,
}

impl Default for CatselConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            lmdb_path: None,
            lmdb_max_size_mb: 64,
        }
    }
}

impl CatselConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `CATSEL_CACHE_ENABLED`: `true`/`1` or `false`/`0` (default: true)
    /// - `CATSEL_LMDB_PATH`: LMDB directory (default: unset, in-memory cache)
    /// - `CATSEL_LMDB_MAX_SIZE_MB`: LMDB map size (default: 64)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache_enabled: std::env::var("CATSEL_CACHE_ENABLED")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.cache_enabled),
            lmdb_path: std::env::var("CATSEL_LMDB_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .or(defaults.lmdb_path),
            lmdb_max_size_mb: std::env::var("CATSEL_LMDB_MAX_SIZE_MB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.lmdb_max_size_mb),
        }
    }

    /// Validate the configuration.
    /// Returns Ok(()) if valid, Err(CatselError::Config) if invalid.
    pub fn validate(&self) -> CatselResult<()> {
        if self.lmdb_max_size_mb == 0 {
            return Err(CatselError::Config(ConfigError::InvalidValue {
                field: "lmdb_max_size_mb".to_string(),
                value: self.lmdb_max_size_mb.to_string(),
                reason: "lmdb_max_size_mb must be greater than 0".to_string(),
            }));
        }

        if let Some(path) = &self.lmdb_path {
            if path.as_os_str().is_empty() {
                return Err(CatselError::Config(ConfigError::InvalidValue {
                    field: "lmdb_path".to_string(),
                    value: String::new(),
                    reason: "lmdb_path must not be empty when set".to_string(),
                }));
            }
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
