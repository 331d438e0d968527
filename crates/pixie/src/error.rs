use std::time::Duration;

/// Failure reported by a key-value persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Unified error type for the pixie crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The string has no recognized color interpretation.
    #[error("invalid color format: {0}")]
    InvalidColorFormat(String),

    /// The persistence backend failed while running `operation`.
    #[error("persistence {operation} failed: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    /// The persistence backend did not answer `operation` in time.
    #[error("persistence {operation} timed out after {timeout:?}")]
    PersistenceTimeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// Name of the persistence operation that failed, if any.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            CoreError::Persistence { operation, .. }
            | CoreError::PersistenceTimeout { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_error_names_operation() {
        let err = CoreError::Persistence {
            operation: "set",
            source: StorageError::Unavailable("disk gone".to_string()),
        };
        assert_eq!(err.operation(), Some("set"));
        assert_eq!(
            err.to_string(),
            "persistence set failed: Storage unavailable: disk gone"
        );
    }

    #[test]
    fn color_errors_carry_no_operation() {
        let err = CoreError::InvalidColorFormat("#zz".to_string());
        assert!(err.operation().is_none());
    }
}
