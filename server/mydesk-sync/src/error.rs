//! Error types for the sync engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the record server
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Local storage error: {0}")]
    LocalStorage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Build the error for a non-2xx response; falls back to `HTTP <code>`
    pub fn http(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {status}"));
        SyncError::Http { status, message }
    }

    /// True for rejections caused by a uniqueness violation (HTTP 409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::Conflict(_) | SyncError::Http { status: 409, .. })
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Serialization(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_fallback() {
        let err = SyncError::http(502, None);
        assert_eq!(err.to_string(), "HTTP 502");

        let err = SyncError::http(409, Some("Duplicate file number".to_string()));
        assert_eq!(err.to_string(), "Duplicate file number");
        assert!(err.is_conflict());
    }

    #[test]
    fn test_blank_server_message_uses_status() {
        let err = SyncError::http(500, Some("  ".to_string()));
        assert_eq!(err.to_string(), "HTTP 500");
        assert!(!err.is_conflict());
    }
}
