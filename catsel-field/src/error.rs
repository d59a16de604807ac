//! Field-level errors.

use catsel_core::CatselError;
use thiserror::Error;

/// Errors surfaced by the field layer.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(transparent)]
    Catsel(#[from] CatselError),

    #[error("Failed to serialize widget config: {0}")]
    Serialization(String),

    #[error("Failed to init subscriber: {0}")]
    Telemetry(String),
}

impl From<serde_json::Error> for FieldError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias for field operations.
pub type FieldResult<T> = Result<T, FieldError>;

#[cfg(test)]
mod tests {
    use super::*;
    use catsel_core::DataAccessError;

    #[test]
    fn test_catsel_error_is_transparent() {
        let err: FieldError = CatselError::from(DataAccessError::Timeout { elapsed_ms: 30 }).into();
        assert_eq!(
            err.to_string(),
            "Data access error: Category query timed out after 30ms"
        );
    }
}
