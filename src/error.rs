//! Engine error taxonomy
//!
//! Insufficient data is not an error: period FCR and trend analysis return
//! structured results with `is_valid = false` and warnings instead.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before any computation ran
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Storage(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_maps_to_engine_not_found() {
        let err: EngineError = StorageError::NotFound {
            entity: "batch",
            id: "B-404".to_string(),
        }
        .into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "batch not found: B-404");
    }

    #[test]
    fn backend_errors_stay_storage_errors() {
        let err: EngineError = StorageError::Backend("disk full".to_string()).into();
        assert!(matches!(err, EngineError::Storage(_)));
    }
}
