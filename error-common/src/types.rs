use thiserror::Error;

use crate::codes;

/// Workspace-wide error enum for store and service code
#[derive(Error, Debug)]
pub enum DeskError {
    /// Input validation errors (missing fields, bad formats)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Uniqueness violations such as a duplicate register file number
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Missing records
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Authentication/authorization errors
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Persistence errors (JSON files, attachments)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    /// Stable error code for logs and API payloads
    pub fn code(&self) -> &'static str {
        match self {
            DeskError::ValidationError(_) => codes::validation::INVALID_INPUT,
            DeskError::ConflictError(_) => codes::storage::DUPLICATE_ENTRY,
            DeskError::NotFoundError(_) => codes::storage::NOT_FOUND,
            DeskError::AuthError(_) => codes::authentication::INVALID_CREDENTIALS,
            DeskError::StorageError(_) => codes::storage::WRITE_FAILED,
            DeskError::NetworkError(_) => codes::network::REQUEST_FAILED,
            DeskError::ConfigError(_) | DeskError::InternalError(_) | DeskError::Other(_) => {
                "INTERNAL_9001"
            }
        }
    }
}

impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        DeskError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(err: serde_json::Error) -> Self {
        DeskError::StorageError(format!("JSON error: {err}"))
    }
}

/// Result type alias for My Desk operations
pub type Result<T> = std::result::Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            DeskError::ConflictError("dup".into()).code(),
            codes::storage::DUPLICATE_ENTRY
        );
        assert_eq!(
            DeskError::ValidationError("bad".into()).code(),
            codes::validation::INVALID_INPUT
        );
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let err: DeskError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(matches!(err, DeskError::StorageError(msg) if msg.contains("disk full")));
    }
}
