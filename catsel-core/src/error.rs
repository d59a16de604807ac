//! Error types for catsel operations

use thiserror::Error;

/// Failures reading categories from the catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataAccessError {
    #[error("Category query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Category source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Category query timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

/// Storage layer errors shared by in-process collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Storage backend failure: {reason}")]
    Backend { reason: String },
}

/// Cache layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Failed to serialize cache payload for {cache_id}: {reason}")]
    Serialization { cache_id: String, reason: String },

    #[error("Failed to deserialize cache payload for {cache_id}: {reason}")]
    Deserialization { cache_id: String, reason: String },

    #[error("Cache backend error: {reason}")]
    Backend { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all catsel errors.
#[derive(Debug, Clone, Error)]
pub enum CatselError {
    #[error("Data access error: {0}")]
    DataAccess(#[from] DataAccessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for catsel operations.
pub type CatselResult<T> = Result<T, CatselError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_access_error_display_timeout() {
        let err = DataAccessError::Timeout { elapsed_ms: 1500 };
        let msg = format!("{}", err);
        assert!(msg.contains("timed out"));
        assert!(msg.contains("1500"));
    }

    #[test]
    fn test_cache_error_display_deserialization() {
        let err = CacheError::Deserialization {
            cache_id: "CATALOG_PRODUCT_CATEGORY_TREE_1_".to_string(),
            reason: "expected value".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("deserialize"));
        assert!(msg.contains("CATALOG_PRODUCT_CATEGORY_TREE_1_"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "lmdb_max_size_mb".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("lmdb_max_size_mb"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_catsel_error_from_variants() {
        let data = CatselError::from(DataAccessError::QueryFailed {
            reason: "connection reset".to_string(),
        });
        assert!(matches!(data, CatselError::DataAccess(_)));

        let storage = CatselError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, CatselError::Storage(_)));

        let cache = CatselError::from(CacheError::Backend {
            reason: "map full".to_string(),
        });
        assert!(matches!(cache, CatselError::Cache(_)));

        let config = CatselError::from(ConfigError::MissingRequired {
            field: "lmdb_path".to_string(),
        });
        assert!(matches!(config, CatselError::Config(_)));
    }

    #[test]
    fn test_storage_error_display_lock_poisoned() {
        let msg = format!("{}", StorageError::LockPoisoned);
        assert!(msg.contains("lock poisoned"));
    }
}
